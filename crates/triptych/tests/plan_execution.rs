//! Plans executed end to end against a canned generator.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use triptych::{
    ApiConfiguration, Credentials, EngineConfig, ExecutionPlan, FunctionCallRequest,
    FunctionCallStatus, GenerationCapability, GenerationOutput, InMemoryExecutionLogger,
    ResponseStatus, RunStatus, TriptychResult, render_result,
};

/// Asks for the weather when the variation is named "tools", otherwise echoes.
#[derive(Debug)]
struct CannedGenerator;

#[async_trait]
impl GenerationCapability for CannedGenerator {
    async fn generate(
        &self,
        configuration: &ApiConfiguration,
        prompt: &str,
    ) -> TriptychResult<GenerationOutput> {
        if configuration.variation_name == "tools" {
            return Ok(GenerationOutput {
                function_calls: vec![FunctionCallRequest::new(
                    "get_weather",
                    json!({"city": "Lisbon"}),
                )],
                latency_ms: 20,
                ..Default::default()
            });
        }
        Ok(GenerationOutput {
            text: format!("echo: {prompt}"),
            latency_ms: 10,
            ..Default::default()
        })
    }

    fn provider_name(&self) -> &'static str {
        "canned"
    }
}

const PLAN: &str = r#"
    [run]
    name = "weather check"
    prompt = "What should I wear?"
    function_calling_enabled = true

    [[variations]]
    variation_name = "plain"
    model_name = "canned-1"

    [[variations]]
    variation_name = "tools"
    model_name = "canned-1"

    [comparison]
    enabled = true
    metrics = ["function_success_rate", "latency"]

    [[functions]]
    name = "get_weather"
    endpoint = "http://127.0.0.1:9/weather"
    required_api_keys = ["TRIPTYCH_TEST_WEATHER_KEY"]
    mock_response = { forecast = "sunny" }
"#;

#[tokio::test]
async fn test_auto_mode_without_credentials_uses_mock() {
    let plan = ExecutionPlan::from_toml_str(PLAN).unwrap();
    let logger = Arc::new(InMemoryExecutionLogger::new());
    let executor = plan.executor(
        Arc::new(CannedGenerator),
        logger.clone(),
        EngineConfig::default(),
    );

    let result = executor
        .execute(plan.to_request(false, Credentials::new()))
        .await
        .unwrap();

    assert_eq!(result.execution_run.status, RunStatus::Completed);
    assert_eq!(result.success_count, 2);

    let tools = result.variation("tools").unwrap();
    assert_eq!(tools.response.status, ResponseStatus::Success);
    let call = &tools.function_calls[0];
    assert!(call.used_mock_data);
    assert_eq!(call.execution_status, FunctionCallStatus::Success);
    assert_eq!(call.response, Some(json!({"forecast": "sunny"})));
    assert_eq!(logger.function_calls().await.len(), 1);

    let plain = result.variation("plain").unwrap();
    assert_eq!(
        plain.response.response_text.as_deref(),
        Some("echo: What should I wear?")
    );

    let comparison = result.comparison.as_ref().unwrap();
    assert_eq!(comparison.best_configuration.variation_name, "plain");

    let summary = render_result(&result);
    assert!(summary.contains("get_weather() success [mock]"));
    assert!(summary.contains("Best: plain by function_success_rate"));
}

#[tokio::test]
async fn test_result_serialises_for_json_output() {
    let plan = ExecutionPlan::from_toml_str(PLAN).unwrap();
    let executor = plan.executor(
        Arc::new(CannedGenerator),
        Arc::new(InMemoryExecutionLogger::new()),
        EngineConfig::default(),
    );

    let result = executor
        .execute(plan.to_request(true, Credentials::new()))
        .await
        .unwrap();
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["execution_run"]["status"], "completed");
    assert_eq!(value["results"].as_array().unwrap().len(), 2);
    assert_eq!(value["results"][1]["function_calls"][0]["used_mock_data"], true);
}
