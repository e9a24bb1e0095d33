//! Response records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one request.
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
pub enum ResponseStatus {
    /// The provider answered
    Success,
    /// Transport, provider or cancellation failure
    Error,
    /// The provider did not answer in time
    Timeout,
}

impl ResponseStatus {
    /// Only `Success` counts as success; everything else is an error.
    pub fn is_success(self) -> bool {
        matches!(self, ResponseStatus::Success)
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    /// Tokens in the generated candidates
    #[serde(default)]
    pub completion_tokens: Option<u32>,
    /// Total billed tokens
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

impl UsageMetadata {
    /// Whether the provider reported nothing.
    pub fn is_empty(&self) -> bool {
        self.prompt_tokens.is_none()
            && self.completion_tokens.is_none()
            && self.total_tokens.is_none()
    }
}

/// The response to exactly one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Unique response identity
    pub id: Uuid,
    /// Request this response answers
    pub request_id: Uuid,
    /// Outcome
    pub status: ResponseStatus,
    /// Generated text (absent on error)
    pub response_text: Option<String>,
    /// Function-call payload surfaced by the provider, plus resolutions
    pub function_call: Option<serde_json::Value>,
    /// Token accounting
    pub usage: UsageMetadata,
    /// Provider finish reason
    pub finish_reason: Option<String>,
    /// Error message for non-success outcomes
    pub error_message: Option<String>,
    /// Latency up to the response or failure point
    pub response_time_ms: u64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ApiResponse {
    /// Build a failed response for the given request.
    pub fn failure(
        request_id: Uuid,
        status: ResponseStatus,
        message: impl Into<String>,
        response_time_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            status,
            response_text: None,
            function_call: None,
            usage: UsageMetadata::default(),
            finish_reason: None,
            error_message: Some(message.into()),
            response_time_ms,
            created_at: Utc::now(),
        }
    }

    /// Whether this response counts as a success.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
