//! Inputs and outputs of the execution service.

use crate::{
    ApiConfiguration, ComparisonConfig, Credentials, ExecutionResult, ExecutionRun, RunStatus,
};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything needed to start one execution run.
///
/// # Examples
///
/// ```
/// use triptych_core::{ApiConfiguration, ExecuteRequest};
///
/// let request = ExecuteRequest::builder()
///     .name("greeting")
///     .prompt("Say hello")
///     .configurations(vec![
///         ApiConfiguration::builder()
///             .variation_name("fast")
///             .model_name("gemini-2.0-flash")
///             .build()
///             .unwrap(),
///     ])
///     .build()
///     .unwrap();
/// assert!(!request.use_mock);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct ExecuteRequest {
    /// Run name
    pub name: String,
    /// Run description
    #[builder(default)]
    #[serde(default)]
    pub description: Option<String>,
    /// Base prompt shared by every variation
    pub prompt: String,
    /// Context appended after the prompt
    #[builder(default)]
    #[serde(default)]
    pub context: Option<String>,
    /// Resolve provider function-call requests
    #[builder(default)]
    #[serde(default)]
    pub function_calling_enabled: bool,
    /// Variations in the order results are reported
    pub configurations: Vec<ApiConfiguration>,
    /// Optional comparison of successful variations
    #[builder(default)]
    #[serde(default)]
    pub comparison: Option<ComparisonConfig>,
    /// Force every function resolution into mock mode
    #[builder(default)]
    #[serde(default)]
    pub use_mock: bool,
    /// Run-scoped secrets
    #[builder(default)]
    #[serde(skip)]
    pub credentials: Credentials,
}

impl ExecuteRequest {
    /// Creates a new request builder.
    pub fn builder() -> ExecuteRequestBuilder {
        ExecuteRequestBuilder::default()
    }
}

/// Returned when an execution has been accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// Identity to poll with
    pub execution_id: Uuid,
    /// Run record at acceptance time
    pub run: ExecutionRun,
}

/// Status of a known execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStatusReport {
    /// Execution identity
    pub execution_id: Uuid,
    /// Current run status
    pub status: RunStatus,
    /// Setup failure message
    pub error: Option<String>,
    /// Result, present only once the status is terminal
    pub result: Option<ExecutionResult>,
}
