//! Engine configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_generation_timeout_ms() -> u64 {
    60_000
}

fn default_function_timeout_ms() -> u64 {
    30_000
}

fn default_log_retry_attempts() -> usize {
    3
}

fn default_log_retry_backoff_ms() -> u64 {
    50
}

fn default_retained_executions() -> usize {
    256
}

/// Timeouts, concurrency and logging retry settings shared by every variation.
///
/// Configuration is threaded explicitly through construction so concurrent
/// runs never share ambient state.
///
/// # Examples
///
/// ```
/// use triptych_executor::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .generation_timeout_ms(5_000u64)
///     .max_concurrency(4usize)
///     .build()
///     .unwrap();
/// assert_eq!(config.function_timeout_ms, 30_000);
/// assert_eq!(config.max_concurrency, Some(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct EngineConfig {
    /// Bound on each generation call
    #[serde(default = "default_generation_timeout_ms")]
    #[builder(default = "default_generation_timeout_ms()")]
    pub generation_timeout_ms: u64,
    /// Bound on each function resolution
    #[serde(default = "default_function_timeout_ms")]
    #[builder(default = "default_function_timeout_ms()")]
    pub function_timeout_ms: u64,
    /// Maximum variations in flight at once; unbounded when absent
    #[serde(default)]
    #[builder(default)]
    pub max_concurrency: Option<usize>,
    /// Retries for a failed log write after the first attempt
    #[serde(default = "default_log_retry_attempts")]
    #[builder(default = "default_log_retry_attempts()")]
    pub log_retry_attempts: usize,
    /// Initial backoff between log write retries
    #[serde(default = "default_log_retry_backoff_ms")]
    #[builder(default = "default_log_retry_backoff_ms()")]
    pub log_retry_backoff_ms: u64,
    /// Finished executions whose full results the service keeps in memory;
    /// older ones are answered from the logger without results
    #[serde(default = "default_retained_executions")]
    #[builder(default = "default_retained_executions()")]
    pub retained_executions: usize,
}

impl EngineConfig {
    /// Creates a new config builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Generation timeout as a duration.
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    /// Function resolution timeout as a duration.
    pub fn function_timeout(&self) -> Duration {
        Duration::from_millis(self.function_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generation_timeout_ms: default_generation_timeout_ms(),
            function_timeout_ms: default_function_timeout_ms(),
            max_concurrency: None,
            log_retry_attempts: default_log_retry_attempts(),
            log_retry_backoff_ms: default_log_retry_backoff_ms(),
            retained_executions: default_retained_executions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str("generation_timeout_ms = 100").unwrap();
        assert_eq!(config.generation_timeout(), Duration::from_millis(100));
        assert_eq!(config.log_retry_attempts, 3);
        assert_eq!(config.max_concurrency, None);
        assert_eq!(config.retained_executions, 256);
    }
}
