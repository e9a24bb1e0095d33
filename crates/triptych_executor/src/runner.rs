//! One configuration's request, generation and function-resolution cycle.

use crate::{EngineConfig, LogWriter, compose_prompt};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use triptych_core::{
    ApiConfiguration, ApiRequest, ApiResponse, Credentials, FunctionCallRecord, FunctionCallResult,
    LogEntry, RequestKind, ResolutionMode, ResponseStatus, VariationResult,
};
use triptych_error::{FunctionError, FunctionErrorKind, GenerationError, GenerationErrorKind};
use triptych_interface::{
    FunctionInvocation, FunctionResolver, GenerationCapability, GenerationOutput,
};
use uuid::Uuid;

/// Inputs shared by every variation of one run.
#[derive(Debug, Clone)]
pub struct VariationInput {
    /// Owning run
    pub run_id: Uuid,
    /// Base prompt
    pub prompt: String,
    /// Context appended after the prompt
    pub context: Option<String>,
    /// Resolve provider function-call requests
    pub function_calling_enabled: bool,
    /// Force every resolution into mock mode
    pub use_mock: bool,
    /// Run-scoped secrets
    pub credentials: Credentials,
}

/// Borrowed state needed to finish a successful generation.
struct Completion<'a> {
    request: &'a ApiRequest,
    variation: &'a str,
    input: &'a VariationInput,
    cancel: &'a CancellationToken,
}

/// Outcome of the generation step before it becomes a response record.
enum Generated {
    Output(GenerationOutput),
    Failed {
        status: ResponseStatus,
        message: String,
    },
}

/// Runs a single configuration. Never fails: every failure is encoded in the
/// returned result's response status.
#[derive(Clone)]
pub struct VariationRunner {
    generator: Arc<dyn GenerationCapability>,
    resolver: Option<Arc<dyn FunctionResolver>>,
    log: LogWriter,
    config: EngineConfig,
}

impl std::fmt::Debug for VariationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariationRunner")
            .field("provider", &self.generator.provider_name())
            .field("resolver", &self.resolver.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl VariationRunner {
    /// Runner without function resolution.
    pub fn new(
        generator: Arc<dyn GenerationCapability>,
        log: LogWriter,
        config: EngineConfig,
    ) -> Self {
        Self {
            generator,
            resolver: None,
            log,
            config,
        }
    }

    /// Resolve provider function calls with `resolver`.
    pub fn with_resolver(mut self, resolver: Arc<dyn FunctionResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Run one configuration.
    pub async fn run(
        &self,
        configuration: &ApiConfiguration,
        input: &VariationInput,
        cancel: &CancellationToken,
    ) -> VariationResult {
        self.run_with_journal(configuration, input, cancel).await.0
    }

    /// Run one configuration, also returning the journal entries it produced.
    #[instrument(
        skip(self, configuration, input, cancel),
        fields(
            run_id = %input.run_id,
            variation = %configuration.variation_name,
            model = %configuration.model_name
        )
    )]
    pub(crate) async fn run_with_journal(
        &self,
        configuration: &ApiConfiguration,
        input: &VariationInput,
        cancel: &CancellationToken,
    ) -> (VariationResult, Vec<LogEntry>) {
        let started = Instant::now();
        let variation = configuration.variation_name.as_str();
        let mut journal = Vec::new();

        let request = self.build_request(configuration, input);
        if let Err(e) = self.log.log_request(&request).await {
            journal.push(LogEntry::warn(Some(variation), format!("request not persisted: {e}")));
        }

        let generation_started = Instant::now();
        let generated = self.generate(configuration, &request.prompt, cancel).await;
        let generation_ms = elapsed_ms(generation_started);

        let (response, function_calls) = match generated {
            Generated::Failed { status, message } => {
                warn!(%status, error = %message, "Variation failed");
                journal.push(LogEntry::error(Some(variation), format!("{status}: {message}")));
                let response = ApiResponse::failure(request.id, status, message, generation_ms);
                (response, Vec::new())
            }
            Generated::Output(output) => {
                let response_time_ms = if output.latency_ms > 0 {
                    output.latency_ms
                } else {
                    generation_ms
                };
                let completion = Completion {
                    request: &request,
                    variation,
                    input,
                    cancel,
                };
                self.complete(completion, output, response_time_ms, &mut journal)
                    .await
            }
        };

        if let Err(e) = self.log.log_response(&response).await {
            journal.push(LogEntry::warn(Some(variation), format!("response not persisted: {e}")));
        }

        let execution_time_ms = elapsed_ms(started);
        info!(
            status = %response.status,
            response_time_ms = response.response_time_ms,
            execution_time_ms,
            function_calls = function_calls.len(),
            "Variation finished"
        );
        if response.is_success() {
            journal.push(LogEntry::info(
                Some(variation),
                format!("success in {} ms", execution_time_ms),
            ));
        }

        let result = VariationResult {
            configuration: configuration.clone(),
            request,
            response,
            function_calls,
            execution_time_ms,
        };
        (result, journal)
    }

    /// The request record. Its body is the provider's wire body when the
    /// generator exposes one, otherwise the parameters that drive the call.
    fn build_request(
        &self,
        configuration: &ApiConfiguration,
        input: &VariationInput,
    ) -> ApiRequest {
        let prompt = compose_prompt(
            configuration.system_prompt.as_deref(),
            &input.prompt,
            input.context.as_deref(),
        );
        let request_body = self
            .generator
            .request_body(configuration, &prompt)
            .unwrap_or_else(|| Self::parameter_body(configuration, &prompt));
        ApiRequest {
            id: Uuid::new_v4(),
            execution_run_id: input.run_id,
            configuration_id: configuration.id,
            request_type: RequestKind::Generate,
            prompt,
            context: input.context.clone(),
            function_name: None,
            function_arguments: None,
            request_body,
            created_at: Utc::now(),
        }
    }

    fn parameter_body(configuration: &ApiConfiguration, prompt: &str) -> Value {
        json!({
            "model": configuration.model_name,
            "prompt": prompt,
            "temperature": configuration.temperature,
            "max_tokens": configuration.max_tokens,
            "top_p": configuration.top_p,
            "top_k": configuration.top_k,
            "safety_settings": configuration.safety_settings,
            "generation_config": configuration.generation_config,
            "tool_config": configuration.tool_config,
        })
    }

    async fn generate(
        &self,
        configuration: &ApiConfiguration,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Generated {
        if cancel.is_cancelled() {
            return Self::cancelled();
        }

        let generation = self.generator.generate(configuration, prompt);
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Self::cancelled(),
            outcome = tokio::time::timeout(self.config.generation_timeout(), generation) => outcome,
        };

        match outcome {
            Ok(Ok(output)) => Generated::Output(output),
            Ok(Err(e)) => match e.as_generation() {
                Some(g) if g.is_timeout() => Generated::Failed {
                    status: ResponseStatus::Timeout,
                    message: g.kind.to_string(),
                },
                Some(g) => Generated::Failed {
                    status: ResponseStatus::Error,
                    message: g.kind.to_string(),
                },
                None => Generated::Failed {
                    status: ResponseStatus::Error,
                    message: e.to_string(),
                },
            },
            Err(_) => {
                let kind = GenerationErrorKind::Timeout(self.config.generation_timeout_ms);
                Generated::Failed {
                    status: ResponseStatus::Timeout,
                    message: kind.to_string(),
                }
            }
        }
    }

    fn cancelled() -> Generated {
        Generated::Failed {
            status: ResponseStatus::Error,
            message: GenerationError::new(GenerationErrorKind::Cancelled)
                .kind
                .to_string(),
        }
    }

    /// Resolve requested function calls and build the success response.
    async fn complete(
        &self,
        completion: Completion<'_>,
        output: GenerationOutput,
        response_time_ms: u64,
        journal: &mut Vec<LogEntry>,
    ) -> (ApiResponse, Vec<FunctionCallRecord>) {
        let Completion {
            request,
            variation,
            input,
            cancel,
        } = completion;
        let mut records = Vec::new();
        let mut cancelled = false;

        let function_call = if output.function_calls.is_empty() {
            None
        } else {
            let calls = serde_json::to_value(&output.function_calls).unwrap_or(Value::Null);
            match (&self.resolver, input.function_calling_enabled) {
                (Some(resolver), true) => {
                    let mut results = Vec::new();
                    for call in &output.function_calls {
                        if cancel.is_cancelled() {
                            cancelled = true;
                            break;
                        }
                        let result = self
                            .resolve(resolver.as_ref(), call, input, cancel)
                            .await;
                        if !result.is_success() {
                            journal.push(LogEntry::warn(
                                Some(variation),
                                format!(
                                    "function '{}' failed: {}",
                                    result.function_name,
                                    result.error_details.as_deref().unwrap_or("unknown error")
                                ),
                            ));
                        }
                        let cancelled_here = cancel.is_cancelled() && !result.is_success();
                        results.push(serde_json::to_value(&result).unwrap_or(Value::Null));
                        let record = result.into_record(request.id);
                        if let Err(e) = self.log.log_function_call(&record).await {
                            journal.push(LogEntry::warn(
                                Some(variation),
                                format!("function call not persisted: {e}"),
                            ));
                        }
                        records.push(record);
                        if cancelled_here {
                            cancelled = true;
                            break;
                        }
                    }
                    Some(json!({ "calls": calls, "results": results }))
                }
                (None, true) => {
                    journal.push(LogEntry::warn(
                        Some(variation),
                        "function calls requested but no resolver is configured",
                    ));
                    Some(json!({ "calls": calls }))
                }
                (_, false) => {
                    debug!("Function calling disabled, surfacing calls unresolved");
                    Some(json!({ "calls": calls }))
                }
            }
        };

        let mut response = ApiResponse {
            id: Uuid::new_v4(),
            request_id: request.id,
            status: ResponseStatus::Success,
            response_text: Some(output.text),
            function_call,
            usage: output.usage,
            finish_reason: output.finish_reason,
            error_message: None,
            response_time_ms,
            created_at: Utc::now(),
        };

        if cancelled {
            let message = GenerationErrorKind::Cancelled.to_string();
            journal.push(LogEntry::error(Some(variation), message.clone()));
            response.status = ResponseStatus::Error;
            response.response_text = None;
            response.error_message = Some(message);
        }

        (response, records)
    }

    async fn resolve(
        &self,
        resolver: &dyn FunctionResolver,
        call: &triptych_core::FunctionCallRequest,
        input: &VariationInput,
        cancel: &CancellationToken,
    ) -> FunctionCallResult {
        let started = Instant::now();
        let mut invocation = FunctionInvocation::new(call, &input.credentials);
        if input.use_mock {
            invocation = invocation.with_mode(ResolutionMode::Mock);
        }

        let failure = |kind: FunctionErrorKind| {
            let err = FunctionError::new(kind);
            FunctionCallResult::failure(
                call,
                err.kind.to_string(),
                elapsed_ms(started),
                input.use_mock,
            )
        };
        let resolution = resolver.resolve(invocation);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => failure(FunctionErrorKind::Cancelled),
            outcome = tokio::time::timeout(self.config.function_timeout(), resolution) => {
                outcome.unwrap_or_else(|_| failure(FunctionErrorKind::Timeout(elapsed_ms(started))))
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
