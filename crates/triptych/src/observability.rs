//! Tracing subscriber setup.

use std::env;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
use triptych_error::{ConfigError, TriptychResult};

/// Log filter and output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info", "triptych=debug")
    pub log_level: String,
    /// Emit JSON lines instead of human-readable text
    pub json_logs: bool,
    /// Include the event target in each line
    pub with_target: bool,
}

impl ObservabilityConfig {
    /// Configuration at the given level.
    pub fn new(log_level: impl Into<String>) -> Self {
        Self {
            log_level: log_level.into(),
            json_logs: false,
            with_target: true,
        }
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Show or hide event targets.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// The effective filter: `RUST_LOG` when set, otherwise `log_level`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unparsable directive.
    pub fn env_filter(&self) -> TriptychResult<EnvFilter> {
        let filter = match env::var(EnvFilter::DEFAULT_ENV) {
            Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
            _ => EnvFilter::try_new(&self.log_level),
        };
        Ok(filter.map_err(|e| ConfigError::new(format!("Invalid log filter: {e}")))?)
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr so that `--json` results on stdout stay parseable.
///
/// # Errors
///
/// Returns a configuration error if the filter is invalid or a global
/// subscriber is already installed.
pub fn init_observability(config: &ObservabilityConfig) -> TriptychResult<()> {
    let env_filter = config.env_filter()?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(config.with_target)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.with_target)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install tracing subscriber: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_flags() {
        let config = ObservabilityConfig::new("debug")
            .with_json_logs(true)
            .with_target(false);
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);
        assert!(!config.with_target);
    }

    #[test]
    fn test_default_filter_parses() {
        let config = ObservabilityConfig::new("info,triptych_executor=debug");
        assert!(config.env_filter().is_ok());
    }
}
