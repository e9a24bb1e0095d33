//! Gemini connection settings.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Public Gemini REST base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

fn default_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> usize {
    3
}

/// Where and how to reach Gemini.
///
/// # Examples
///
/// ```
/// use triptych_models::GeminiSettings;
///
/// let settings = GeminiSettings::builder()
///     .base_url("http://localhost:8080")
///     .max_retries(0usize)
///     .build()
///     .unwrap();
/// assert_eq!(settings.api_key_env, "GEMINI_API_KEY");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct GeminiSettings {
    /// REST base URL, without trailing slash
    #[serde(default = "default_base_url")]
    #[builder(default = "default_base_url()")]
    pub base_url: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    #[builder(default = "default_api_key_env()")]
    pub api_key_env: String,
    /// HTTP client timeout in seconds
    #[serde(default = "default_timeout_secs")]
    #[builder(default = "default_timeout_secs()")]
    pub timeout_secs: u64,
    /// Retries for transient provider errors (0 disables retry)
    #[serde(default = "default_max_retries")]
    #[builder(default = "default_max_retries()")]
    pub max_retries: usize,
    /// Override of the initial retry backoff
    #[serde(default)]
    #[builder(default)]
    pub retry_backoff_ms: Option<u64>,
}

impl GeminiSettings {
    /// Creates a new settings builder.
    pub fn builder() -> GeminiSettingsBuilder {
        GeminiSettingsBuilder::default()
    }
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: None,
        }
    }
}
