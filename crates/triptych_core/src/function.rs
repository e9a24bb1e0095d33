//! Function-calling types: definitions, provider requests, resolutions and records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// How a function call is resolved.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum ResolutionMode {
    /// Return the recorded mock payload verbatim
    Mock,
    /// Call the registered endpoint
    Real,
    /// Real when the session holds every required key, otherwise mock
    #[default]
    Auto,
}

/// HTTP method used to reach a function endpoint.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    /// Arguments sent as query parameters
    #[serde(alias = "get")]
    Get,
    /// Arguments sent as JSON body
    #[default]
    #[serde(alias = "post")]
    Post,
    /// Arguments sent as JSON body
    #[serde(alias = "put")]
    Put,
    /// Arguments sent as JSON body
    #[serde(alias = "patch")]
    Patch,
    /// Arguments sent as query parameters
    #[serde(alias = "delete")]
    Delete,
}

impl HttpMethod {
    /// Whether arguments travel in the query string rather than the body.
    pub fn uses_query(self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

/// A callable function registered with the resolver.
///
/// Header values may reference session credentials as `{{KEY_NAME}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name as the provider emits it
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Endpoint URL for real calls
    #[serde(default)]
    pub endpoint: Option<String>,
    /// HTTP method for real calls
    #[serde(default)]
    pub method: HttpMethod,
    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Credential names that must be present for a real call
    #[serde(default)]
    pub required_api_keys: Vec<String>,
    /// Recorded payload returned in mock mode
    #[serde(default)]
    pub mock_response: Option<serde_json::Value>,
    /// Declared resolution mode
    #[serde(default)]
    pub mode: ResolutionMode,
}

impl FunctionDefinition {
    /// Create a definition with only a mock payload.
    pub fn mock(name: impl Into<String>, mock_response: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            endpoint: None,
            method: HttpMethod::default(),
            headers: BTreeMap::new(),
            required_api_keys: Vec::new(),
            mock_response: Some(mock_response),
            mode: ResolutionMode::Mock,
        }
    }
}

/// A function call the provider asked the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallRequest {
    /// Function name
    pub name: String,
    /// Arguments as JSON
    pub arguments: serde_json::Value,
}

impl FunctionCallRequest {
    /// Create a new call request.
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Execution status of a function call.
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
pub enum FunctionCallStatus {
    /// Not yet resolved
    Pending,
    /// Resolved with a payload
    Success,
    /// Resolution failed; see error details
    Error,
}

/// Outcome of resolving one function call. Failures are encoded, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallResult {
    /// Function name
    pub function_name: String,
    /// Arguments the call was resolved with
    pub arguments: serde_json::Value,
    /// Payload returned by the mock or endpoint
    pub response: Option<serde_json::Value>,
    /// Outcome
    pub execution_status: FunctionCallStatus,
    /// Time spent resolving, up to cancellation on timeout
    pub execution_time_ms: u64,
    /// Failure description
    pub error_details: Option<String>,
    /// Whether the payload came from a recorded mock
    pub used_mock_data: bool,
}

impl FunctionCallResult {
    /// A successful resolution.
    pub fn success(
        request: &FunctionCallRequest,
        response: serde_json::Value,
        execution_time_ms: u64,
        used_mock_data: bool,
    ) -> Self {
        Self {
            function_name: request.name.clone(),
            arguments: request.arguments.clone(),
            response: Some(response),
            execution_status: FunctionCallStatus::Success,
            execution_time_ms,
            error_details: None,
            used_mock_data,
        }
    }

    /// A failed resolution.
    pub fn failure(
        request: &FunctionCallRequest,
        error_details: impl Into<String>,
        execution_time_ms: u64,
        used_mock_data: bool,
    ) -> Self {
        Self {
            function_name: request.name.clone(),
            arguments: request.arguments.clone(),
            response: None,
            execution_status: FunctionCallStatus::Error,
            execution_time_ms,
            error_details: Some(error_details.into()),
            used_mock_data,
        }
    }

    /// Whether the call resolved successfully.
    pub fn is_success(&self) -> bool {
        self.execution_status == FunctionCallStatus::Success
    }

    /// Attach this result to the request that triggered it.
    pub fn into_record(self, request_id: Uuid) -> FunctionCallRecord {
        FunctionCallRecord {
            id: Uuid::new_v4(),
            request_id,
            function_name: self.function_name,
            arguments: self.arguments,
            response: self.response,
            execution_status: self.execution_status,
            execution_time_ms: self.execution_time_ms,
            error_details: self.error_details,
            used_mock_data: self.used_mock_data,
            created_at: Utc::now(),
        }
    }
}

/// Persisted function call linked to its originating request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallRecord {
    /// Unique record identity
    pub id: Uuid,
    /// Originating request
    pub request_id: Uuid,
    /// Function name
    pub function_name: String,
    /// Arguments
    pub arguments: serde_json::Value,
    /// Response payload
    pub response: Option<serde_json::Value>,
    /// Outcome
    pub execution_status: FunctionCallStatus,
    /// Resolution latency
    pub execution_time_ms: u64,
    /// Failure description
    pub error_details: Option<String>,
    /// Whether the payload came from a recorded mock
    pub used_mock_data: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_definition_defaults() {
        let def: FunctionDefinition =
            serde_json::from_value(json!({"name": "get_weather"})).unwrap();
        assert_eq!(def.method, HttpMethod::Post);
        assert_eq!(def.mode, ResolutionMode::Auto);
        assert!(def.required_api_keys.is_empty());
    }

    #[test]
    fn test_http_method_parses_any_case() {
        assert_eq!(HttpMethod::from_str("get").unwrap(), HttpMethod::Get);
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert!(HttpMethod::Get.uses_query());
        assert!(!HttpMethod::Put.uses_query());
    }

    #[test]
    fn test_result_into_record_preserves_outcome() {
        let call = FunctionCallRequest::new("lookup", json!({"q": 1}));
        let result = FunctionCallResult::failure(&call, "boom", 12, false);
        let request_id = Uuid::new_v4();
        let record = result.into_record(request_id);
        assert_eq!(record.request_id, request_id);
        assert_eq!(record.execution_status, FunctionCallStatus::Error);
        assert_eq!(record.error_details.as_deref(), Some("boom"));
        assert_eq!(record.execution_time_ms, 12);
    }
}
