//! API configurations: one named variation of model and sampling parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One named configuration evaluated against the base prompt of a run.
///
/// Sampling parameters are independently optional; the engine never fills in
/// defaults for absent values, leaving that to the provider.
///
/// # Examples
///
/// ```
/// use triptych_core::ApiConfiguration;
///
/// let config = ApiConfiguration::builder()
///     .variation_name("fast")
///     .model_name("gemini-2.0-flash")
///     .temperature(0.2)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.variation_name, "fast");
/// assert_eq!(config.temperature, Some(0.2));
/// assert!(config.max_tokens.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
pub struct ApiConfiguration {
    /// Unique configuration identity
    #[builder(default = "Uuid::new_v4()")]
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Owning execution run, assigned when the run is created
    #[builder(default)]
    #[serde(default)]
    pub execution_run_id: Option<Uuid>,

    /// Variation name, unique within a run
    #[builder(setter(into))]
    pub variation_name: String,

    /// Provider model identifier
    #[builder(setter(into))]
    pub model_name: String,

    /// System prompt prepended to the base prompt
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Sampling temperature
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Maximum output tokens
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Nucleus sampling threshold
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub top_p: Option<f32>,

    /// Top-k sampling cutoff
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub top_k: Option<u32>,

    /// Provider safety settings, forwarded verbatim
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub safety_settings: Option<serde_json::Value>,

    /// Additional provider generation config, merged under the sampling parameters
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub generation_config: Option<serde_json::Value>,

    /// Provider tool declarations, forwarded verbatim
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub tool_config: Option<serde_json::Value>,

    /// Creation timestamp
    #[builder(default = "Utc::now()")]
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ApiConfiguration {
    /// Creates a new configuration builder.
    pub fn builder() -> ApiConfigurationBuilder {
        ApiConfigurationBuilder::default()
    }

    /// Returns a copy owned by the given run.
    pub fn owned_by(&self, run_id: Uuid) -> Self {
        Self {
            execution_run_id: Some(run_id),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_names() {
        let err = ApiConfiguration::builder().model_name("m").build();
        assert!(err.is_err());
    }

    #[test]
    fn test_deserialize_fills_identity_and_leaves_sampling_absent() {
        let config: ApiConfiguration = toml::from_str(
            r#"
                variation_name = "creative"
                model_name = "gemini-2.0-flash"
                temperature = 0.9
            "#,
        )
        .unwrap();

        assert_eq!(config.variation_name, "creative");
        assert_eq!(config.temperature, Some(0.9));
        assert!(config.top_p.is_none());
        assert!(config.top_k.is_none());
        assert!(config.execution_run_id.is_none());
        assert_ne!(config.id, Uuid::nil());
    }

    #[test]
    fn test_owned_by_assigns_run() {
        let config = ApiConfiguration::builder()
            .variation_name("a")
            .model_name("m")
            .build()
            .unwrap();
        let run_id = Uuid::new_v4();
        let owned = config.owned_by(run_id);
        assert_eq!(owned.execution_run_id, Some(run_id));
        assert_eq!(owned.id, config.id);
    }
}
