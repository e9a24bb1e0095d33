//! Mock, real and auto resolution of function calls.

use crate::substitute_credentials;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use triptych_core::{
    Credentials, FunctionCallRequest, FunctionCallResult, FunctionDefinition, HttpMethod,
    ResolutionMode,
};
use triptych_error::{FunctionError, FunctionErrorKind};
use triptych_interface::{FunctionInvocation, FunctionRegistry, FunctionResolver};

/// Per-call timeout applied when none is configured.
pub const DEFAULT_FUNCTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolves function calls against a registry, calling endpoints over HTTP.
#[derive(Clone)]
pub struct HttpFunctionResolver {
    registry: Arc<dyn FunctionRegistry>,
    client: reqwest::Client,
    timeout: Duration,
}

impl std::fmt::Debug for HttpFunctionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFunctionResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpFunctionResolver {
    /// Resolver with the default timeout.
    pub fn new(registry: Arc<dyn FunctionRegistry>) -> Self {
        Self {
            registry,
            client: reqwest::Client::new(),
            timeout: DEFAULT_FUNCTION_TIMEOUT,
        }
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn effective_mode(
        definition: &FunctionDefinition,
        forced: Option<ResolutionMode>,
        credentials: &Credentials,
    ) -> ResolutionMode {
        match forced.unwrap_or(definition.mode) {
            ResolutionMode::Auto => {
                let has_keys = credentials.missing(&definition.required_api_keys).is_empty();
                if definition.endpoint.is_some() && has_keys {
                    ResolutionMode::Real
                } else {
                    ResolutionMode::Mock
                }
            }
            mode => mode,
        }
    }

    fn resolve_mock(
        definition: &FunctionDefinition,
        call: &FunctionCallRequest,
        started: Instant,
    ) -> FunctionCallResult {
        match &definition.mock_response {
            Some(payload) => {
                FunctionCallResult::success(call, payload.clone(), elapsed_ms(started), true)
            }
            None => {
                let err = FunctionError::new(FunctionErrorKind::NoMockResponse(call.name.clone()));
                FunctionCallResult::failure(call, err.kind.to_string(), elapsed_ms(started), true)
            }
        }
    }

    async fn resolve_real(
        &self,
        definition: &FunctionDefinition,
        call: &FunctionCallRequest,
        credentials: &Credentials,
        started: Instant,
    ) -> FunctionCallResult {
        let missing = credentials.missing(&definition.required_api_keys);
        if !missing.is_empty() {
            let err = FunctionError::new(FunctionErrorKind::MissingApiKeys(missing.join(", ")));
            warn!(function = %call.name, error = %err.kind, "Refusing real call");
            return live_failure(call, &err, started);
        }

        let Some(endpoint) = definition.endpoint.as_deref() else {
            let err = FunctionError::new(FunctionErrorKind::NoEndpoint(call.name.clone()));
            return live_failure(call, &err, started);
        };

        let request = self.build_request(definition, endpoint, call, credentials);
        match tokio::time::timeout(self.timeout, self.send(request)).await {
            Ok(Ok(payload)) => {
                FunctionCallResult::success(call, payload, elapsed_ms(started), false)
            }
            Ok(Err(err)) => {
                warn!(function = %call.name, error = %err.kind, "Function endpoint failed");
                live_failure(call, &err, started)
            }
            Err(_) => {
                let elapsed = elapsed_ms(started);
                let err = FunctionError::new(FunctionErrorKind::Timeout(elapsed));
                warn!(function = %call.name, elapsed_ms = elapsed, "Function call timed out");
                FunctionCallResult::failure(call, err.kind.to_string(), elapsed, false)
            }
        }
    }

    fn build_request(
        &self,
        definition: &FunctionDefinition,
        endpoint: &str,
        call: &FunctionCallRequest,
        credentials: &Credentials,
    ) -> reqwest::RequestBuilder {
        let method = match definition.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut request = self.client.request(method, endpoint);
        for (name, value) in &definition.headers {
            request = request.header(name.as_str(), substitute_credentials(value, credentials));
        }

        if definition.method.uses_query() {
            request.query(&query_pairs(&call.arguments))
        } else {
            request.json(&call.arguments)
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, FunctionError> {
        let response = request
            .send()
            .await
            .map_err(|e| FunctionError::new(FunctionErrorKind::Transport(e.to_string())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FunctionError::new(FunctionErrorKind::Transport(e.to_string())))?;

        if !status.is_success() {
            return Err(FunctionError::new(FunctionErrorKind::Http {
                status_code: status.as_u16(),
                message: body,
            }));
        }

        Ok(serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body)))
    }
}

#[async_trait]
impl FunctionResolver for HttpFunctionResolver {
    #[instrument(skip(self, invocation), fields(function = %invocation.call.name))]
    async fn resolve(&self, invocation: FunctionInvocation<'_>) -> FunctionCallResult {
        let started = Instant::now();
        let call = invocation.call;

        let Some(definition) = self.registry.get_function_definition(&call.name) else {
            let err = FunctionError::new(FunctionErrorKind::NotRegistered(call.name.clone()));
            warn!(error = %err.kind, "Unknown function requested");
            return live_failure(call, &err, started);
        };

        let mode = Self::effective_mode(&definition, invocation.mode, invocation.credentials);
        debug!(%mode, declared = %definition.mode, "Resolving function call");

        match mode {
            ResolutionMode::Real => {
                self.resolve_real(&definition, call, invocation.credentials, started)
                    .await
            }
            _ => Self::resolve_mock(&definition, call, started),
        }
    }

    fn definitions(&self) -> Vec<FunctionDefinition> {
        self.registry.definitions()
    }
}

/// Failure of a call that never reached mock data.
fn live_failure(
    call: &FunctionCallRequest,
    err: &FunctionError,
    started: Instant,
) -> FunctionCallResult {
    FunctionCallResult::failure(call, err.kind.to_string(), elapsed_ms(started), false)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Flatten object arguments into query pairs; scalars keep their plain form.
fn query_pairs(arguments: &serde_json::Value) -> Vec<(String, String)> {
    match arguments {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect(),
        serde_json::Value::Null => Vec::new(),
        other => vec![("value".to_string(), other.to_string())],
    }
}
