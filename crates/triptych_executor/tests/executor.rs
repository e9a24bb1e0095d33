//! Multi-variation executor behaviour.

mod common;

use common::{
    Fault, FlakyLogger, Script, ScriptedGenerator, configuration, fast_config, request, shared,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use triptych_core::{
    ComparisonConfig, FunctionCallRequest, FunctionCallStatus, FunctionDefinition, HttpMethod,
    LogLevel, ResolutionMode, ResponseStatus, RunStatus,
};
use triptych_error::{ExecutionErrorKind, TriptychErrorKind};
use triptych_executor::{EngineConfig, InMemoryExecutionLogger, MultiVariationExecutor};
use triptych_functions::{HttpFunctionResolver, InMemoryFunctionRegistry};
use triptych_interface::ExecutionLogger;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn executor(
    generator: ScriptedGenerator,
    logger: Arc<dyn ExecutionLogger>,
) -> MultiVariationExecutor {
    MultiVariationExecutor::new(Arc::new(generator), logger, fast_config())
}

#[tokio::test]
async fn test_fast_succeeds_and_creative_times_out() {
    let generator = ScriptedGenerator::new()
        .on("fast", Script::reply("hi", 10))
        .on("creative", Script::Timeout);
    let logger = shared(InMemoryExecutionLogger::new());
    let executor = executor(generator, logger.clone());

    let result = executor
        .execute(request(vec![
            configuration("fast", 0.2),
            configuration("creative", 0.9),
        ]))
        .await
        .expect("execution");

    assert_eq!(result.success_count, 1);
    assert_eq!(result.error_count, 1);
    assert_eq!(result.results[0].response.status, ResponseStatus::Success);
    assert_eq!(result.results[0].response.response_text.as_deref(), Some("hi"));
    assert_eq!(result.results[0].response.response_time_ms, 10);
    assert_eq!(result.results[1].response.status, ResponseStatus::Timeout);
    assert!(result.results[1].response.response_text.is_none());
    assert_eq!(result.execution_run.status, RunStatus::Completed);

    let stored = logger.get_run(result.execution_run.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RunStatus::Completed);
    assert_eq!(logger.requests(result.execution_run.id).await.len(), 2);
    assert_eq!(logger.responses().await.len(), 2);
    assert_eq!(logger.configurations(result.execution_run.id).await.len(), 2);
}

#[tokio::test]
async fn test_engine_timeout_bounds_hanging_generation() {
    let generator = ScriptedGenerator::new().on("slow", Script::Hang);
    let config = EngineConfig {
        generation_timeout_ms: 50,
        ..fast_config()
    };
    let executor = MultiVariationExecutor::new(
        Arc::new(generator),
        shared(InMemoryExecutionLogger::new()),
        config,
    );

    let result = executor
        .execute(request(vec![configuration("slow", 0.5)]))
        .await
        .unwrap();

    let response = &result.results[0].response;
    assert_eq!(response.status, ResponseStatus::Timeout);
    assert!(response.error_message.as_deref().unwrap().contains("timed out"));
    assert!(response.response_time_ms >= 50);
}

#[tokio::test]
async fn test_all_errors_still_completes_run() {
    let generator = ScriptedGenerator::new()
        .on("a", Script::Fail("boom".into()))
        .on("b", Script::Fail("bang".into()))
        .on("c", Script::Timeout);
    let executor = executor(generator, shared(InMemoryExecutionLogger::new()));

    let result = executor
        .execute(request(vec![
            configuration("a", 0.1),
            configuration("b", 0.2),
            configuration("c", 0.3),
        ]))
        .await
        .unwrap();

    assert_eq!(result.success_count, 0);
    assert_eq!(result.error_count, 3);
    assert!(result.results.iter().all(|r| !r.is_success()));
    assert_eq!(result.execution_run.status, RunStatus::Completed);
    assert!(result.results[0]
        .response
        .error_message
        .as_deref()
        .unwrap()
        .contains("boom"));
}

#[tokio::test]
async fn test_results_follow_input_order_not_completion_order() {
    let generator = ScriptedGenerator::new()
        .on("slowest", Script::delayed("3", 150))
        .on("middle", Script::delayed("2", 75))
        .on("quickest", Script::delayed("1", 0));
    let executor = executor(generator, shared(InMemoryExecutionLogger::new()));

    let result = executor
        .execute(request(vec![
            configuration("slowest", 0.1),
            configuration("middle", 0.2),
            configuration("quickest", 0.3),
        ]))
        .await
        .unwrap();

    let names: Vec<&str> = result.results.iter().map(|r| r.variation_name()).collect();
    assert_eq!(names, vec!["slowest", "middle", "quickest"]);
    assert_eq!(result.success_count + result.error_count, 3);
    // concurrent: wall clock is closer to the slowest than to the sum
    assert!(result.total_time_ms < 150 + 75 + 100);
}

#[tokio::test]
async fn test_zero_configurations_is_rejected_before_run_exists() {
    let logger = shared(InMemoryExecutionLogger::new());
    let executor = executor(ScriptedGenerator::new(), logger.clone());

    let err = executor.execute(request(vec![])).await.unwrap_err();

    let execution = err.as_execution().expect("execution error");
    assert_eq!(execution.kind, ExecutionErrorKind::NoConfigurations);
    assert!(err.to_string().contains("at least one configuration required"));
    assert!(logger.list_runs(10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_variation_names_are_rejected() {
    let executor = executor(ScriptedGenerator::new(), shared(InMemoryExecutionLogger::new()));

    let err = executor
        .execute(request(vec![configuration("same", 0.1), configuration("same", 0.2)]))
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_execution().map(|e| &e.kind),
        Some(ExecutionErrorKind::DuplicateVariation(name)) if name == "same"
    ));
}

#[tokio::test]
async fn test_prompt_joins_system_prompt_and_context_in_order() {
    let generator = Arc::new(ScriptedGenerator::new());
    let executor = MultiVariationExecutor::new(
        generator.clone(),
        shared(InMemoryExecutionLogger::new()),
        fast_config(),
    );
    let mut config = configuration("v", 0.5);
    config.system_prompt = Some("Be terse.".into());
    let mut req = request(vec![config]);
    req.context = Some("Audience: kids".into());

    let result = executor.execute(req).await.unwrap();

    let expected = "System: Be terse.\n\nSay hello\n\nContext: Audience: kids";
    assert_eq!(generator.prompts.lock().unwrap().as_slice(), [expected]);
    assert_eq!(result.results[0].request.prompt, expected);
    assert_eq!(
        result.results[0].request.context.as_deref(),
        Some("Audience: kids")
    );
}

#[tokio::test]
async fn test_request_log_records_provider_wire_body() {
    let wire = json!({"contents": [{"role": "user", "parts": [{"text": "Say hello"}]}]});
    let generator = ScriptedGenerator::new()
        .on("v", Script::reply("hi", 1))
        .on("broken", Script::Fail("x".into()))
        .with_wire_body(wire.clone());
    let logger = shared(InMemoryExecutionLogger::new());
    let executor = executor(generator, logger.clone());

    let result = executor
        .execute(request(vec![configuration("v", 0.5), configuration("broken", 0.5)]))
        .await
        .unwrap();

    let logged = logger.requests(result.execution_run.id).await;
    assert_eq!(logged.len(), 2);
    assert!(logged.iter().all(|r| r.request_body == wire));
    assert_eq!(result.results[0].request.request_body, wire);
}

#[tokio::test]
async fn test_request_log_falls_back_to_parameters_without_wire_body() {
    let logger = shared(InMemoryExecutionLogger::new());
    let executor = executor(ScriptedGenerator::new(), logger.clone());

    let result = executor
        .execute(request(vec![configuration("v", 0.5)]))
        .await
        .unwrap();

    let logged = logger.requests(result.execution_run.id).await;
    assert_eq!(logged[0].request_body["model"], json!("gemini-test"));
    assert_eq!(logged[0].request_body["prompt"], json!("Say hello"));
}

#[tokio::test]
async fn test_comparison_picks_best_successful_variation() {
    let generator = ScriptedGenerator::new()
        .on("fast", Script::reply("hi", 10))
        .on("slow", Script::reply("hello", 900))
        .on("broken", Script::Fail("x".into()));
    let logger = shared(InMemoryExecutionLogger::new());
    let executor = executor(generator, logger.clone());
    let mut req = request(vec![
        configuration("slow", 0.1),
        configuration("fast", 0.2),
        configuration("broken", 0.3),
    ]);
    req.comparison = Some(ComparisonConfig::new(["latency", "response_length"]));

    let result = executor.execute(req).await.unwrap();

    let comparison = result.comparison.expect("comparison");
    assert_eq!(comparison.best_configuration.variation_name, "fast");
    let ids: Vec<_> = result.results.iter().map(|r| r.configuration.id).collect();
    assert!(ids.contains(&comparison.best_configuration_id));
    assert_eq!(comparison.configuration_scores.len(), 2);
    assert_eq!(logger.comparisons(result.execution_run.id).await.len(), 1);
}

#[tokio::test]
async fn test_comparison_tie_on_first_metric_uses_second() {
    let generator = ScriptedGenerator::new()
        .on("terse", Script::reply("hi", 100))
        .on("chatty", Script::reply("hello there friend", 100));
    let executor = executor(generator, shared(InMemoryExecutionLogger::new()));
    let mut req = request(vec![configuration("terse", 0.1), configuration("chatty", 0.2)]);
    req.comparison = Some(ComparisonConfig::new(["latency", "response_length"]));

    let result = executor.execute(req).await.unwrap();

    let comparison = result.comparison.unwrap();
    assert_eq!(comparison.best_configuration.variation_name, "chatty");
}

#[tokio::test]
async fn test_comparison_without_successes_is_logged_not_fatal() {
    let generator = ScriptedGenerator::new().on("only", Script::Fail("down".into()));
    let executor = executor(generator, shared(InMemoryExecutionLogger::new()));
    let mut req = request(vec![configuration("only", 0.1)]);
    req.comparison = Some(ComparisonConfig::new(["latency"]));

    let result = executor.execute(req).await.expect("run still returned");

    assert!(result.comparison.is_none());
    assert_eq!(result.execution_run.status, RunStatus::Completed);
    assert!(result.logs.iter().any(|e| e.level == LogLevel::Error
        && e.message.contains("no successful variations to compare")));
}

#[tokio::test]
async fn test_disabled_comparison_is_never_run() {
    let generator = ScriptedGenerator::new().on("a", Script::reply("hi", 1));
    let logger = shared(InMemoryExecutionLogger::new());
    let executor = executor(generator, logger.clone());
    let mut req = request(vec![configuration("a", 0.1)]);
    req.comparison = Some(ComparisonConfig {
        enabled: false,
        ..ComparisonConfig::new(["not_a_metric"])
    });

    let result = executor.execute(req).await.unwrap();

    assert!(result.comparison.is_none());
    assert!(!result.logs.iter().any(|e| e.message.contains("comparison")));
    assert!(logger.comparisons(result.execution_run.id).await.is_empty());
}

#[tokio::test]
async fn test_use_mock_never_reaches_real_endpoint() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"live": true})))
        .expect(0)
        .mount(&server)
        .await;

    let definition = FunctionDefinition {
        name: "get_weather".into(),
        description: None,
        endpoint: Some(format!("{}/weather", server.uri())),
        method: HttpMethod::Post,
        headers: BTreeMap::new(),
        required_api_keys: vec![],
        mock_response: Some(json!({"temp": 18})),
        mode: ResolutionMode::Real,
    };
    let registry = InMemoryFunctionRegistry::new().with(definition);
    let resolver = HttpFunctionResolver::new(Arc::new(registry));

    let generator = ScriptedGenerator::new().on(
        "tools",
        Script::Calls(vec![FunctionCallRequest::new("get_weather", json!({"city": "Oslo"}))]),
    );
    let logger = shared(InMemoryExecutionLogger::new());
    let executor = executor(generator, logger.clone()).with_resolver(Arc::new(resolver));
    let mut req = request(vec![configuration("tools", 0.1)]);
    req.function_calling_enabled = true;
    req.use_mock = true;

    let result = executor.execute(req).await.unwrap();

    let variation = &result.results[0];
    assert!(variation.is_success());
    assert_eq!(variation.function_calls.len(), 1);
    let call = &variation.function_calls[0];
    assert!(call.used_mock_data);
    assert_eq!(call.execution_status, FunctionCallStatus::Success);
    assert_eq!(call.request_id, variation.request.id);
    assert_eq!(call.response, Some(json!({"temp": 18})));
    let payload = variation.response.function_call.as_ref().unwrap();
    assert_eq!(payload["calls"][0]["name"], "get_weather");
    assert_eq!(payload["results"][0]["used_mock_data"], true);
    assert_eq!(logger.function_calls().await.len(), 1);
}

#[tokio::test]
async fn test_disabled_function_calling_surfaces_calls_unresolved() {
    let registry = InMemoryFunctionRegistry::new()
        .with(FunctionDefinition::mock("lookup", json!({"ok": true})));
    let resolver = HttpFunctionResolver::new(Arc::new(registry));
    let generator = ScriptedGenerator::new().on(
        "tools",
        Script::Calls(vec![FunctionCallRequest::new("lookup", json!({}))]),
    );
    let executor = executor(generator, shared(InMemoryExecutionLogger::new()))
        .with_resolver(Arc::new(resolver));

    let result = executor
        .execute(request(vec![configuration("tools", 0.1)]))
        .await
        .unwrap();

    let variation = &result.results[0];
    assert!(variation.function_calls.is_empty());
    let payload = variation.response.function_call.as_ref().unwrap();
    assert_eq!(payload["calls"][0]["name"], "lookup");
    assert!(payload.get("results").is_none());
}

#[tokio::test]
async fn test_failed_function_keeps_variation_successful() {
    let resolver = HttpFunctionResolver::new(Arc::new(InMemoryFunctionRegistry::new()));
    let generator = ScriptedGenerator::new().on(
        "tools",
        Script::Calls(vec![FunctionCallRequest::new("unknown_fn", json!({}))]),
    );
    let executor = executor(generator, shared(InMemoryExecutionLogger::new()))
        .with_resolver(Arc::new(resolver));
    let mut req = request(vec![configuration("tools", 0.1)]);
    req.function_calling_enabled = true;

    let result = executor.execute(req).await.unwrap();

    let variation = &result.results[0];
    assert!(variation.is_success());
    assert_eq!(variation.function_calls[0].execution_status, FunctionCallStatus::Error);
    assert!(result
        .logs
        .iter()
        .any(|e| e.level == LogLevel::Warn && e.message.contains("unknown_fn")));
}

#[tokio::test]
async fn test_cancellation_marks_in_flight_variations_error() {
    let generator = ScriptedGenerator::new()
        .on("quick", Script::reply("done", 1))
        .on("stuck", Script::Hang);
    let executor = executor(generator, shared(InMemoryExecutionLogger::new()));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result = executor
        .execute_with_cancel(
            request(vec![configuration("quick", 0.1), configuration("stuck", 0.2)]),
            cancel,
        )
        .await
        .unwrap();

    assert_eq!(result.results[0].response.status, ResponseStatus::Success);
    let stuck = &result.results[1].response;
    assert_eq!(stuck.status, ResponseStatus::Error);
    assert_eq!(stuck.error_message.as_deref(), Some("execution cancelled"));
    assert_eq!(result.execution_run.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_run_record_failure_is_setup_error() {
    let generator = Arc::new(ScriptedGenerator::new());
    let executor = MultiVariationExecutor::new(
        generator.clone(),
        shared(FlakyLogger::new(Fault::CreateRun)),
        fast_config(),
    );

    let err = executor
        .execute(request(vec![configuration("a", 0.1)]))
        .await
        .unwrap_err();

    match err.kind() {
        TriptychErrorKind::Execution(e) => {
            assert!(matches!(e.kind, ExecutionErrorKind::RunSetup(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_configuration_write_failure_marks_run_failed() {
    let logger = shared(FlakyLogger::new(Fault::LogConfiguration));
    let generator = Arc::new(ScriptedGenerator::new());
    let executor = MultiVariationExecutor::new(generator.clone(), logger.clone(), fast_config());

    let err = executor
        .execute(request(vec![configuration("a", 0.1)]))
        .await
        .unwrap_err();

    assert!(err.as_execution().is_some());
    let runs = logger.list_runs(10, 0).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Failed);
    assert!(runs[0].error_message.as_deref().unwrap().contains("configuration"));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_transient_log_failures_are_retried() {
    let logger = shared(FlakyLogger::new(Fault::Requests(2)));
    let executor = MultiVariationExecutor::new(
        Arc::new(ScriptedGenerator::new()),
        logger.clone(),
        fast_config(),
    );

    let result = executor
        .execute(request(vec![configuration("a", 0.1)]))
        .await
        .unwrap();

    assert_eq!(logger.request_attempts.load(Ordering::SeqCst), 3);
    assert_eq!(logger.inner.requests(result.execution_run.id).await.len(), 1);
    assert!(!result.logs.iter().any(|e| e.message.contains("not persisted")));
}

#[tokio::test]
async fn test_persistent_log_failure_is_bounded_and_result_kept() {
    let logger = shared(FlakyLogger::new(Fault::Responses));
    let executor = MultiVariationExecutor::new(
        Arc::new(ScriptedGenerator::new().on("a", Script::reply("hi", 1))),
        logger.clone(),
        fast_config(),
    );

    let result = executor
        .execute(request(vec![configuration("a", 0.1)]))
        .await
        .unwrap();

    // first attempt plus three retries
    assert_eq!(logger.response_attempts.load(Ordering::SeqCst), 4);
    assert!(result.results[0].is_success());
    assert_eq!(result.success_count, 1);
    assert!(result
        .logs
        .iter()
        .any(|e| e.message.contains("response not persisted")));
}

#[tokio::test]
async fn test_concurrency_limit_serialises_variations() {
    let generator = ScriptedGenerator::new()
        .on("a", Script::delayed("a", 60))
        .on("b", Script::delayed("b", 60))
        .on("c", Script::delayed("c", 60));
    let config = EngineConfig {
        max_concurrency: Some(1),
        ..fast_config()
    };
    let executor = MultiVariationExecutor::new(
        Arc::new(generator),
        shared(InMemoryExecutionLogger::new()),
        config,
    );

    let result = executor
        .execute(request(vec![
            configuration("a", 0.1),
            configuration("b", 0.2),
            configuration("c", 0.3),
        ]))
        .await
        .unwrap();

    assert_eq!(result.success_count, 3);
    assert!(result.total_time_ms >= 180);
}
