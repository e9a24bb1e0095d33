//! Row types for the execution tables and their conversions to and from the
//! core records.

use crate::schema::{
    api_configurations, api_requests, api_responses, comparison_results, execution_runs,
    function_calls,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;
use triptych_core::{
    ApiConfiguration, ApiRequest, ApiResponse, ComparisonResult, ExecutionRun, FunctionCallRecord,
    RunStatus,
};
use triptych_error::DatabaseError;
use uuid::Uuid;

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// A stored execution run.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = execution_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExecutionRunRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub function_calling_enabled: bool,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ExecutionRun> for ExecutionRunRow {
    fn from(run: &ExecutionRun) -> Self {
        Self {
            id: run.id,
            name: run.name.clone(),
            description: run.description.clone(),
            function_calling_enabled: run.function_calling_enabled,
            status: run.status.to_string(),
            error_message: run.error_message.clone(),
            created_at: run.created_at,
            updated_at: run.updated_at,
        }
    }
}

impl ExecutionRunRow {
    /// Parsed lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns a corrupt-row error for a status string no release ever wrote.
    pub fn run_status(&self) -> Result<RunStatus, DatabaseError> {
        RunStatus::from_str(&self.status).map_err(|_| {
            DatabaseError::corrupt_row(
                "execution_runs",
                format!("unknown run status '{}' for run {}", self.status, self.id),
            )
        })
    }
}

impl TryFrom<ExecutionRunRow> for ExecutionRun {
    type Error = DatabaseError;

    fn try_from(row: ExecutionRunRow) -> Result<Self, Self::Error> {
        let status = row.run_status()?;
        Ok(ExecutionRun {
            id: row.id,
            name: row.name,
            description: row.description,
            function_calling_enabled: row.function_calling_enabled,
            status,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// New API configuration row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = api_configurations)]
pub struct NewApiConfigurationRow {
    pub id: Uuid,
    pub execution_run_id: Option<Uuid>,
    pub variation_name: String,
    pub model_name: String,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
    pub top_p: Option<f32>,
    pub top_k: Option<i32>,
    pub safety_settings: Option<serde_json::Value>,
    pub generation_config: Option<serde_json::Value>,
    pub tool_config: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&ApiConfiguration> for NewApiConfigurationRow {
    fn from(config: &ApiConfiguration) -> Self {
        Self {
            id: config.id,
            execution_run_id: config.execution_run_id,
            variation_name: config.variation_name.clone(),
            model_name: config.model_name.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens.map(to_i32),
            top_p: config.top_p,
            top_k: config.top_k.map(to_i32),
            safety_settings: config.safety_settings.clone(),
            generation_config: config.generation_config.clone(),
            tool_config: config.tool_config.clone(),
            created_at: config.created_at,
        }
    }
}

/// New API request row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = api_requests)]
pub struct NewApiRequestRow {
    pub id: Uuid,
    pub execution_run_id: Uuid,
    pub configuration_id: Uuid,
    pub request_type: String,
    pub prompt: String,
    pub context: Option<String>,
    pub function_name: Option<String>,
    pub function_arguments: Option<serde_json::Value>,
    pub request_body: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<&ApiRequest> for NewApiRequestRow {
    fn from(request: &ApiRequest) -> Self {
        Self {
            id: request.id,
            execution_run_id: request.execution_run_id,
            configuration_id: request.configuration_id,
            request_type: request.request_type.to_string(),
            prompt: request.prompt.clone(),
            context: request.context.clone(),
            function_name: request.function_name.clone(),
            function_arguments: request.function_arguments.clone(),
            request_body: request.request_body.clone(),
            created_at: request.created_at,
        }
    }
}

/// New API response row. Usage counters are flattened into columns.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = api_responses)]
pub struct NewApiResponseRow {
    pub id: Uuid,
    pub request_id: Uuid,
    pub status: String,
    pub response_text: Option<String>,
    pub function_call: Option<serde_json::Value>,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
    pub finish_reason: Option<String>,
    pub error_message: Option<String>,
    pub response_time_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&ApiResponse> for NewApiResponseRow {
    fn from(response: &ApiResponse) -> Self {
        Self {
            id: response.id,
            request_id: response.request_id,
            status: response.status.to_string(),
            response_text: response.response_text.clone(),
            function_call: response.function_call.clone(),
            prompt_tokens: response.usage.prompt_tokens.map(to_i32),
            completion_tokens: response.usage.completion_tokens.map(to_i32),
            total_tokens: response.usage.total_tokens.map(to_i32),
            finish_reason: response.finish_reason.clone(),
            error_message: response.error_message.clone(),
            response_time_ms: to_i64(response.response_time_ms),
            created_at: response.created_at,
        }
    }
}

/// New function call row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = function_calls)]
pub struct NewFunctionCallRow {
    pub id: Uuid,
    pub request_id: Uuid,
    pub function_name: String,
    pub arguments: serde_json::Value,
    pub response: Option<serde_json::Value>,
    pub execution_status: String,
    pub execution_time_ms: i64,
    pub error_details: Option<String>,
    pub used_mock_data: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&FunctionCallRecord> for NewFunctionCallRow {
    fn from(call: &FunctionCallRecord) -> Self {
        Self {
            id: call.id,
            request_id: call.request_id,
            function_name: call.function_name.clone(),
            arguments: call.arguments.clone(),
            response: call.response.clone(),
            execution_status: call.execution_status.to_string(),
            execution_time_ms: to_i64(call.execution_time_ms),
            error_details: call.error_details.clone(),
            used_mock_data: call.used_mock_data,
            created_at: call.created_at,
        }
    }
}

/// New comparison row. The winning configuration is stored by id only.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comparison_results)]
pub struct NewComparisonRow {
    pub id: Uuid,
    pub execution_run_id: Uuid,
    pub comparison_type: String,
    pub metric_name: String,
    pub configuration_scores: serde_json::Value,
    pub best_configuration_id: Uuid,
    pub analysis_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&ComparisonResult> for NewComparisonRow {
    type Error = DatabaseError;

    fn try_from(comparison: &ComparisonResult) -> Result<Self, Self::Error> {
        Ok(Self {
            id: comparison.id,
            execution_run_id: comparison.execution_run_id,
            comparison_type: comparison.comparison_type.clone(),
            metric_name: comparison.metric_name.clone(),
            configuration_scores: serde_json::to_value(&comparison.configuration_scores)?,
            best_configuration_id: comparison.best_configuration_id,
            analysis_notes: comparison.analysis_notes.clone(),
            created_at: comparison.created_at,
        })
    }
}
