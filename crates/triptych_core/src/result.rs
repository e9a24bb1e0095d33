//! Per-variation and per-run results.

use crate::{
    ApiConfiguration, ApiRequest, ApiResponse, ComparisonResult, ExecutionRun,
    FunctionCallRecord,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of an in-band log entry.
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
pub enum LogLevel {
    /// Progress information
    Info,
    /// Degraded but continuing
    Warn,
    /// A failure recorded without aborting the run
    Error,
}

/// One entry of a run's journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub level: LogLevel,
    /// Variation the entry concerns, if any
    pub variation: Option<String>,
    /// Message text
    pub message: String,
}

impl LogEntry {
    fn at(level: LogLevel, variation: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            variation: variation.map(str::to_string),
            message: message.into(),
        }
    }

    /// Informational entry.
    pub fn info(variation: Option<&str>, message: impl Into<String>) -> Self {
        Self::at(LogLevel::Info, variation, message)
    }

    /// Warning entry.
    pub fn warn(variation: Option<&str>, message: impl Into<String>) -> Self {
        Self::at(LogLevel::Warn, variation, message)
    }

    /// Error entry.
    pub fn error(variation: Option<&str>, message: impl Into<String>) -> Self {
        Self::at(LogLevel::Error, variation, message)
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.timestamp.to_rfc3339(), self.level)?;
        if let Some(variation) = &self.variation {
            write!(f, " ({})", variation)?;
        }
        write!(f, " {}", self.message)
    }
}

/// Outcome of running one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationResult {
    /// Configuration used
    pub configuration: ApiConfiguration,
    /// Request issued
    pub request: ApiRequest,
    /// Response received or synthesised on failure
    pub response: ApiResponse,
    /// Function calls resolved for this variation, in provider order
    pub function_calls: Vec<FunctionCallRecord>,
    /// Elapsed time from request construction to the last resolution
    pub execution_time_ms: u64,
}

impl VariationResult {
    /// Whether the response status is success.
    pub fn is_success(&self) -> bool {
        self.response.is_success()
    }

    /// Variation name of the configuration.
    pub fn variation_name(&self) -> &str {
        &self.configuration.variation_name
    }
}

/// Aggregated outcome of one execution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The run record in its final state
    pub execution_run: ExecutionRun,
    /// Variation results in configuration input order
    pub results: Vec<VariationResult>,
    /// Comparison, when requested and successful
    pub comparison: Option<ComparisonResult>,
    /// Wall-clock duration of the whole run
    pub total_time_ms: u64,
    /// Variations whose response status is success
    pub success_count: usize,
    /// Variations whose response status is anything else
    pub error_count: usize,
    /// Ordered journal for the run
    pub logs: Vec<LogEntry>,
}

impl ExecutionResult {
    /// Assemble a result, deriving the counts from the response statuses.
    pub fn assemble(
        execution_run: ExecutionRun,
        results: Vec<VariationResult>,
        comparison: Option<ComparisonResult>,
        total_time_ms: u64,
        logs: Vec<LogEntry>,
    ) -> Self {
        let success_count = results.iter().filter(|r| r.is_success()).count();
        let error_count = results.len() - success_count;
        Self {
            execution_run,
            results,
            comparison,
            total_time_ms,
            success_count,
            error_count,
            logs,
        }
    }

    /// Result for the named variation.
    pub fn variation(&self, name: &str) -> Option<&VariationResult> {
        self.results.iter().find(|r| r.variation_name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RequestKind, ResponseStatus, UsageMetadata};
    use uuid::Uuid;

    fn variation(name: &str, status: ResponseStatus) -> VariationResult {
        let configuration = ApiConfiguration::builder()
            .variation_name(name)
            .model_name("gemini-test")
            .build()
            .unwrap();
        let request = ApiRequest {
            id: Uuid::new_v4(),
            execution_run_id: Uuid::new_v4(),
            configuration_id: configuration.id,
            request_type: RequestKind::Generate,
            prompt: "p".into(),
            context: None,
            function_name: None,
            function_arguments: None,
            request_body: serde_json::Value::Null,
            created_at: Utc::now(),
        };
        let response = ApiResponse {
            id: Uuid::new_v4(),
            request_id: request.id,
            status,
            response_text: None,
            function_call: None,
            usage: UsageMetadata::default(),
            finish_reason: None,
            error_message: None,
            response_time_ms: 1,
            created_at: Utc::now(),
        };
        VariationResult {
            configuration,
            request,
            response,
            function_calls: vec![],
            execution_time_ms: 1,
        }
    }

    #[test]
    fn test_assemble_counts_timeout_as_error() {
        let run = ExecutionRun::new("r", None, false);
        let result = ExecutionResult::assemble(
            run,
            vec![
                variation("a", ResponseStatus::Success),
                variation("b", ResponseStatus::Timeout),
                variation("c", ResponseStatus::Error),
            ],
            None,
            5,
            vec![],
        );
        assert_eq!(result.success_count, 1);
        assert_eq!(result.error_count, 2);
        assert!(result.variation("b").is_some());
    }

    #[test]
    fn test_log_entry_display_includes_variation() {
        let entry = LogEntry::warn(Some("fast"), "slow response");
        let rendered = entry.to_string();
        assert!(rendered.contains("[warn] (fast) slow response"));
    }
}
