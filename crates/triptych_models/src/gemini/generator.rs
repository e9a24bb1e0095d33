//! Gemini generation capability.

use super::dto::{Content, GenerateContentRequest, GenerateContentResponse};
use crate::GeminiSettings;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::time::{Duration, Instant};
use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};
use tracing::{debug, error, info, instrument, warn};
use triptych_core::{ApiConfiguration, FunctionCallRequest, FunctionDefinition};
use triptych_error::{
    GenerationError, GenerationErrorKind, HttpError, JsonError, RetryableError, TriptychResult,
};
use triptych_interface::{GenerationCapability, GenerationOutput};

/// Generation capability backed by the Gemini REST API.
#[derive(Clone)]
pub struct GeminiGenerator {
    client: reqwest::Client,
    settings: GeminiSettings,
    api_key: String,
    functions: Vec<FunctionDefinition>,
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("base_url", &self.settings.base_url)
            .field("api_key", &"[REDACTED]")
            .field("functions", &self.functions.len())
            .finish()
    }
}

impl GeminiGenerator {
    /// Creates a generator with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or the HTTP client cannot be built.
    #[instrument(name = "gemini_generator_new", skip(api_key))]
    pub fn new(api_key: impl Into<String>, settings: GeminiSettings) -> TriptychResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::MissingApiKey(
                settings.api_key_env.clone(),
            ))
            .into());
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build HTTP client: {}", e)))?;

        debug!(base_url = %settings.base_url, "Creating Gemini generator");
        Ok(Self {
            client,
            settings,
            api_key,
            functions: Vec::new(),
        })
    }

    /// Creates a generator reading the key from `settings.api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationErrorKind::MissingApiKey` if the variable is unset.
    pub fn from_env(settings: GeminiSettings) -> TriptychResult<Self> {
        let api_key = std::env::var(&settings.api_key_env).map_err(|_| {
            GenerationError::new(GenerationErrorKind::MissingApiKey(
                settings.api_key_env.clone(),
            ))
        })?;
        Self::new(api_key, settings)
    }

    /// Declare functions the model may call.
    pub fn with_functions(mut self, functions: Vec<FunctionDefinition>) -> Self {
        self.functions = functions;
        self
    }

    /// Settings in use.
    pub fn settings(&self) -> &GeminiSettings {
        &self.settings
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Sampling parameters layered over the configuration's generation blob.
    fn generation_config(configuration: &ApiConfiguration) -> Option<Value> {
        let mut config = match &configuration.generation_config {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        if let Some(temperature) = configuration.temperature {
            config.insert("temperature".into(), json!(temperature));
        }
        if let Some(max_tokens) = configuration.max_tokens {
            config.insert("maxOutputTokens".into(), json!(max_tokens));
        }
        if let Some(top_p) = configuration.top_p {
            config.insert("topP".into(), json!(top_p));
        }
        if let Some(top_k) = configuration.top_k {
            config.insert("topK".into(), json!(top_k));
        }
        (!config.is_empty()).then_some(Value::Object(config))
    }

    fn tools(&self) -> Option<Value> {
        if self.functions.is_empty() {
            return None;
        }
        let declarations: Vec<Value> = self
            .functions
            .iter()
            .map(|f| {
                let mut decl = json!({ "name": f.name });
                if let Some(description) = &f.description {
                    decl["description"] = json!(description);
                }
                decl
            })
            .collect();
        Some(json!([{ "functionDeclarations": declarations }]))
    }

    fn build_request(
        &self,
        configuration: &ApiConfiguration,
        prompt: &str,
    ) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            generation_config: Self::generation_config(configuration),
            safety_settings: configuration.safety_settings.clone(),
            tools: self.tools(),
            tool_config: configuration.tool_config.clone(),
        }
    }

    /// Serialized `generateContent` body.
    fn encode_request(
        &self,
        configuration: &ApiConfiguration,
        prompt: &str,
    ) -> Result<Value, JsonError> {
        serde_json::to_value(self.build_request(configuration, prompt))
            .map_err(|e| JsonError::new(e.to_string()))
    }

    async fn send_once(
        &self,
        model: &str,
        body: &Value,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::new(GenerationErrorKind::Timeout(
                        self.settings.timeout_secs.saturating_mul(1000),
                    ))
                } else {
                    error!(error = ?e, "Failed to send request to Gemini");
                    GenerationError::new(GenerationErrorKind::Transport(e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Gemini returned error");
            return Err(GenerationError::new(GenerationErrorKind::Http {
                status_code: status.as_u16(),
                message: body,
            }));
        }

        response.json().await.map_err(|e| {
            error!(error = ?e, "Failed to parse Gemini response");
            GenerationError::new(GenerationErrorKind::InvalidResponse(e.to_string()))
        })
    }

    async fn send_with_retry(
        &self,
        model: &str,
        body: &Value,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let first = self.send_once(model, body).await;
        let err = match first {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        if !err.is_retryable() || self.settings.max_retries == 0 {
            warn!(error = %err, "Permanent Gemini error, failing immediately");
            return Err(err);
        }

        let (mut initial_ms, retries, max_delay_secs) = err.retry_strategy_params();
        if let Some(backoff) = self.settings.retry_backoff_ms {
            initial_ms = backoff;
        }
        let retries = retries.min(self.settings.max_retries);
        info!(
            error = %err,
            model,
            initial_backoff_ms = initial_ms,
            max_retries = retries,
            "Gemini request failed, will retry"
        );

        let strategy = ExponentialBackoff::from_millis(initial_ms)
            .factor(2)
            .max_delay(Duration::from_secs(max_delay_secs))
            .map(jitter)
            .take(retries);

        let this = self;
        Retry::spawn(strategy, move || async move {
            match this.send_once(model, body).await {
                Ok(response) => Ok(response),
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, "Gemini request failed, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => Err(RetryError::Permanent(e)),
            }
        })
        .await
    }

    fn convert_response(
        response: GenerateContentResponse,
        latency_ms: u64,
    ) -> Result<GenerationOutput, GenerationError> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response.prompt_feedback.and_then(|f| f.block_reason);
            return Err(GenerationError::new(match reason {
                Some(reason) => GenerationErrorKind::Blocked(reason),
                None => GenerationErrorKind::InvalidResponse("response had no candidates".into()),
            }));
        };

        let mut text = String::new();
        let mut function_calls = Vec::new();
        for part in candidate.content.unwrap_or_default().parts {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(call) = part.function_call {
                function_calls.push(FunctionCallRequest::new(call.name, call.args));
            }
        }

        Ok(GenerationOutput {
            text,
            finish_reason: candidate.finish_reason,
            usage: response.usage_metadata.map(Into::into).unwrap_or_default(),
            function_calls,
            latency_ms,
        })
    }
}

#[async_trait]
impl GenerationCapability for GeminiGenerator {
    #[instrument(
        skip(self, configuration, prompt),
        fields(model = %configuration.model_name, variation = %configuration.variation_name)
    )]
    async fn generate(
        &self,
        configuration: &ApiConfiguration,
        prompt: &str,
    ) -> TriptychResult<GenerationOutput> {
        let body = self.encode_request(configuration, prompt)?;

        let started = Instant::now();
        let response = self.send_with_retry(&configuration.model_name, &body).await?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let output = Self::convert_response(response, latency_ms)?;
        debug!(
            latency_ms,
            function_calls = output.function_calls.len(),
            finish_reason = ?output.finish_reason,
            "Received Gemini response"
        );
        Ok(output)
    }

    fn request_body(&self, configuration: &ApiConfiguration, prompt: &str) -> Option<Value> {
        self.encode_request(configuration, prompt).ok()
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration() -> ApiConfiguration {
        ApiConfiguration::builder()
            .variation_name("v")
            .model_name("gemini-test")
            .temperature(0.5)
            .max_tokens(64)
            .generation_config(json!({"maxOutputTokens": 10, "candidateCount": 1}))
            .build()
            .unwrap()
    }

    #[test]
    fn test_generation_config_prefers_explicit_fields() {
        let config = GeminiGenerator::generation_config(&configuration()).unwrap();
        assert_eq!(config["maxOutputTokens"], json!(64));
        assert_eq!(config["candidateCount"], json!(1));
        assert_eq!(config["temperature"], json!(0.5));
        assert!(config.get("topP").is_none());
    }

    #[test]
    fn test_absent_sampling_sends_no_generation_config() {
        let config = ApiConfiguration::builder()
            .variation_name("v")
            .model_name("m")
            .build()
            .unwrap();
        assert!(GeminiGenerator::generation_config(&config).is_none());
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let err = GeminiGenerator::new("", GeminiSettings::default()).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_blocked_prompt_maps_to_blocked() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        let err = GeminiGenerator::convert_response(response, 1).unwrap_err();
        assert!(matches!(err.kind, GenerationErrorKind::Blocked(ref r) if r == "SAFETY"));
    }
}
