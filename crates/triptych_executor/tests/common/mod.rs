//! Scripted collaborators shared by the executor tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use triptych_core::{
    ApiConfiguration, ApiRequest, ApiResponse, ComparisonResult, ExecuteRequest, ExecutionRun,
    FunctionCallRecord, FunctionCallRequest, UsageMetadata,
};
use triptych_error::{
    GenerationError, GenerationErrorKind, LoggerError, LoggerErrorKind, TriptychResult,
};
use triptych_executor::{EngineConfig, InMemoryExecutionLogger};
use triptych_interface::{ExecutionLogger, GenerationCapability, GenerationOutput};
use uuid::Uuid;

/// What the scripted generator does for one variation.
#[derive(Debug, Clone)]
pub enum Script {
    /// Answer with text after an optional delay
    Reply {
        text: String,
        latency_ms: u64,
        delay: Duration,
    },
    /// Ask for function calls
    Calls(Vec<FunctionCallRequest>),
    /// Fail with a provider error
    Fail(String),
    /// Report a provider timeout
    Timeout,
    /// Never answer
    Hang,
}

impl Script {
    pub fn reply(text: &str, latency_ms: u64) -> Self {
        Script::Reply {
            text: text.to_string(),
            latency_ms,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(text: &str, delay_ms: u64) -> Self {
        Script::Reply {
            text: text.to_string(),
            latency_ms: 0,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

/// Generation capability answering per variation name.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    scripts: HashMap<String, Script>,
    wire_body: Option<serde_json::Value>,
    pub prompts: std::sync::Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, variation: &str, script: Script) -> Self {
        self.scripts.insert(variation.to_string(), script);
        self
    }

    /// Expose a fixed provider wire body.
    pub fn with_wire_body(mut self, body: serde_json::Value) -> Self {
        self.wire_body = Some(body);
        self
    }
}

#[async_trait]
impl GenerationCapability for ScriptedGenerator {
    async fn generate(
        &self,
        configuration: &ApiConfiguration,
        prompt: &str,
    ) -> TriptychResult<GenerationOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let script = self
            .scripts
            .get(&configuration.variation_name)
            .cloned()
            .unwrap_or_else(|| Script::reply("default", 1));

        match script {
            Script::Reply {
                text,
                latency_ms,
                delay,
            } => {
                tokio::time::sleep(delay).await;
                Ok(GenerationOutput {
                    text,
                    finish_reason: Some("STOP".into()),
                    usage: UsageMetadata {
                        prompt_tokens: Some(4),
                        completion_tokens: Some(2),
                        total_tokens: Some(6),
                    },
                    function_calls: vec![],
                    latency_ms,
                })
            }
            Script::Calls(calls) => Ok(GenerationOutput {
                text: String::new(),
                function_calls: calls,
                latency_ms: 5,
                ..Default::default()
            }),
            Script::Fail(message) => {
                Err(GenerationError::new(GenerationErrorKind::Transport(message)).into())
            }
            Script::Timeout => Err(GenerationError::new(GenerationErrorKind::Timeout(10)).into()),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(GenerationOutput::default())
            }
        }
    }

    fn request_body(
        &self,
        _configuration: &ApiConfiguration,
        _prompt: &str,
    ) -> Option<serde_json::Value> {
        self.wire_body.clone()
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Which writes the flaky logger rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    CreateRun,
    LogConfiguration,
    /// Fail the first N request writes, then succeed
    Requests(usize),
    /// Fail every response write
    Responses,
}

/// In-memory logger with injected faults.
#[derive(Debug)]
pub struct FlakyLogger {
    pub inner: InMemoryExecutionLogger,
    fault: Fault,
    pub request_attempts: AtomicUsize,
    pub response_attempts: AtomicUsize,
}

impl FlakyLogger {
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: InMemoryExecutionLogger::new(),
            fault,
            request_attempts: AtomicUsize::new(0),
            response_attempts: AtomicUsize::new(0),
        }
    }

    fn unavailable() -> triptych_error::TriptychError {
        LoggerError::new(LoggerErrorKind::Unavailable("injected".into())).into()
    }
}

#[async_trait]
impl ExecutionLogger for FlakyLogger {
    async fn create_run(&self, run: &ExecutionRun) -> TriptychResult<()> {
        if self.fault == Fault::CreateRun {
            return Err(Self::unavailable());
        }
        self.inner.create_run(run).await
    }

    async fn update_run(&self, run: &ExecutionRun) -> TriptychResult<()> {
        self.inner.update_run(run).await
    }

    async fn log_configuration(&self, configuration: &ApiConfiguration) -> TriptychResult<()> {
        if self.fault == Fault::LogConfiguration {
            return Err(Self::unavailable());
        }
        self.inner.log_configuration(configuration).await
    }

    async fn log_request(&self, request: &ApiRequest) -> TriptychResult<()> {
        let attempt = self.request_attempts.fetch_add(1, Ordering::SeqCst);
        if let Fault::Requests(n) = self.fault {
            if attempt < n {
                return Err(Self::unavailable());
            }
        }
        self.inner.log_request(request).await
    }

    async fn log_response(&self, response: &ApiResponse) -> TriptychResult<()> {
        self.response_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fault == Fault::Responses {
            return Err(Self::unavailable());
        }
        self.inner.log_response(response).await
    }

    async fn log_function_call(&self, call: &FunctionCallRecord) -> TriptychResult<()> {
        self.inner.log_function_call(call).await
    }

    async fn log_comparison(&self, comparison: &ComparisonResult) -> TriptychResult<()> {
        self.inner.log_comparison(comparison).await
    }

    async fn get_run(&self, id: Uuid) -> TriptychResult<Option<ExecutionRun>> {
        self.inner.get_run(id).await
    }

    async fn list_runs(&self, limit: usize, offset: usize) -> TriptychResult<Vec<ExecutionRun>> {
        self.inner.list_runs(limit, offset).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

pub fn configuration(name: &str, temperature: f32) -> ApiConfiguration {
    ApiConfiguration::builder()
        .variation_name(name)
        .model_name("gemini-test")
        .temperature(temperature)
        .build()
        .expect("configuration")
}

pub fn request(configurations: Vec<ApiConfiguration>) -> ExecuteRequest {
    ExecuteRequest::builder()
        .name("test run")
        .prompt("Say hello")
        .configurations(configurations)
        .build()
        .expect("request")
}

pub fn fast_config() -> EngineConfig {
    EngineConfig::builder()
        .generation_timeout_ms(2_000u64)
        .function_timeout_ms(2_000u64)
        .log_retry_backoff_ms(1u64)
        .build()
        .expect("engine config")
}

pub fn shared<T: ExecutionLogger + 'static>(logger: T) -> Arc<T> {
    Arc::new(logger)
}
