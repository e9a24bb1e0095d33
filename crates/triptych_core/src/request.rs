//! Outbound request records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of outbound request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestKind {
    /// Single-turn text generation
    Generate,
    /// Multi-turn chat
    Chat,
    /// Request carrying function results
    FunctionCall,
}

/// One request issued for a variation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Unique request identity
    pub id: Uuid,
    /// Owning execution run
    pub execution_run_id: Uuid,
    /// Configuration the request was built from
    pub configuration_id: Uuid,
    /// Request kind
    pub request_type: RequestKind,
    /// Full prompt text sent to the provider
    pub prompt: String,
    /// Context text, if any
    pub context: Option<String>,
    /// Function name for function-call requests
    pub function_name: Option<String>,
    /// Function arguments for function-call requests
    pub function_arguments: Option<serde_json::Value>,
    /// Raw outbound body
    pub request_body: serde_json::Value,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
