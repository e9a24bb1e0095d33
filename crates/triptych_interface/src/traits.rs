//! Capability traits consumed by the executor.

use crate::{FunctionInvocation, GenerationOutput};
use async_trait::async_trait;
use triptych_core::{
    ApiConfiguration, ApiRequest, ApiResponse, ComparisonResult, ExecutionRun,
    FunctionCallRecord, FunctionCallResult, FunctionDefinition,
};
use triptych_error::TriptychResult;
use uuid::Uuid;

/// A text generation backend.
///
/// Implementations may be slow and may fail independently per call. Timeouts
/// are enforced by the caller; an implementation that knows it timed out
/// should return `GenerationErrorKind::Timeout`.
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    /// Generate a response for the given configuration and full prompt.
    async fn generate(
        &self,
        configuration: &ApiConfiguration,
        prompt: &str,
    ) -> TriptychResult<GenerationOutput>;

    /// The provider-native body `generate` would send for this configuration
    /// and prompt, recorded on the request log before the call is made.
    ///
    /// Backends without a wire format return `None`.
    fn request_body(
        &self,
        _configuration: &ApiConfiguration,
        _prompt: &str,
    ) -> Option<serde_json::Value> {
        None
    }

    /// Provider name (e.g., "gemini").
    fn provider_name(&self) -> &'static str;
}

/// Durable sink for execution history.
///
/// Writes are append-only from the engine's perspective and must be safe to
/// call concurrently for the same run. Every record carries an identity
/// assigned before the first write attempt; writing a record whose identity
/// already exists is a no-op, so failed writes may be retried.
#[async_trait]
pub trait ExecutionLogger: Send + Sync {
    /// Persist a new run.
    async fn create_run(&self, run: &ExecutionRun) -> TriptychResult<()>;

    /// Persist the run's current status, error message and update time.
    async fn update_run(&self, run: &ExecutionRun) -> TriptychResult<()>;

    /// Persist a configuration belonging to a run.
    async fn log_configuration(&self, configuration: &ApiConfiguration) -> TriptychResult<()>;

    /// Persist an outbound request.
    async fn log_request(&self, request: &ApiRequest) -> TriptychResult<()>;

    /// Persist a response.
    async fn log_response(&self, response: &ApiResponse) -> TriptychResult<()>;

    /// Persist a resolved function call.
    async fn log_function_call(&self, call: &FunctionCallRecord) -> TriptychResult<()>;

    /// Persist a comparison result.
    async fn log_comparison(&self, comparison: &ComparisonResult) -> TriptychResult<()>;

    /// Fetch a run by identity.
    async fn get_run(&self, id: Uuid) -> TriptychResult<Option<ExecutionRun>>;

    /// List runs, newest first.
    async fn list_runs(&self, limit: usize, offset: usize) -> TriptychResult<Vec<ExecutionRun>>;

    /// Backend name for diagnostics.
    fn backend_name(&self) -> &'static str;
}

/// Lookup of callable function definitions.
pub trait FunctionRegistry: Send + Sync {
    /// Definition registered under `name`, if any.
    fn get_function_definition(&self, name: &str) -> Option<FunctionDefinition>;

    /// All registered definitions.
    fn definitions(&self) -> Vec<FunctionDefinition>;
}

/// Resolves provider function-call requests.
///
/// Resolution never fails outright: every failure is encoded in the returned
/// result's `execution_status` and `error_details`.
#[async_trait]
pub trait FunctionResolver: Send + Sync {
    /// Resolve one function call.
    async fn resolve(&self, invocation: FunctionInvocation<'_>) -> FunctionCallResult;

    /// Definitions the resolver knows about, advertised to the provider.
    fn definitions(&self) -> Vec<FunctionDefinition>;
}
