//! Layered application configuration.

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};
use triptych_error::{ConfigError, TriptychResult};
use triptych_executor::EngineConfig;
#[cfg(feature = "gemini")]
use triptych_models::GeminiSettings;

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../triptych.toml");

fn default_pool_size() -> u32 {
    10
}

/// Postgres connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Connection URL; falls back to `DATABASE_URL` when absent
    #[serde(default)]
    pub url: Option<String>,
    /// Pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: default_pool_size(),
        }
    }
}

impl DatabaseSettings {
    /// The configured URL, or `DATABASE_URL` from the environment or a `.env` file.
    pub fn resolve_url(&self) -> Option<String> {
        if let Some(url) = self.url.as_ref().filter(|u| !u.is_empty()) {
            return Some(url.clone());
        }
        let _ = dotenvy::dotenv();
        std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty())
    }
}

/// Everything the CLI needs to build an execution service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriptychConfig {
    /// Engine timeouts, concurrency and logging retries
    #[serde(default)]
    pub engine: EngineConfig,
    /// Gemini endpoint settings
    #[cfg(feature = "gemini")]
    #[serde(default)]
    pub gemini: GeminiSettings,
    /// Postgres settings
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl TriptychConfig {
    /// Load configuration with precedence (later sources override earlier):
    ///
    /// 1. Bundled defaults (`triptych.toml` shipped with the crate)
    /// 2. `~/.config/triptych/triptych.toml`
    /// 3. `./triptych.toml`
    /// 4. `TRIPTYCH_<SECTION>__<KEY>` environment variables
    ///
    /// Missing user files are skipped.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a present source cannot be parsed.
    #[instrument]
    pub fn load() -> TriptychResult<Self> {
        debug!("Loading configuration: env > current dir > config dir > bundled defaults");

        let mut builder = Self::defaults();
        if let Some(dir) = dirs::config_dir() {
            let user_config = dir.join("triptych").join("triptych.toml");
            builder = builder.add_source(File::from(user_config).required(false));
        }
        builder = builder.add_source(File::with_name("triptych").required(false));
        Self::finish(builder.add_source(Self::environment()))
    }

    /// Load bundled defaults overridden by one file and the environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> TriptychResult<Self> {
        let builder = Self::defaults()
            .add_source(File::from(path.as_ref()))
            .add_source(Self::environment());
        Self::finish(builder)
    }

    fn defaults() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn environment() -> Environment {
        Environment::with_prefix("TRIPTYCH")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> TriptychResult<Self> {
        let config = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {e}")))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {e}")))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bundled_defaults_parse() {
        let config: TriptychConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.database.pool_size, 10);
        #[cfg(feature = "gemini")]
        assert_eq!(config.gemini, GeminiSettings::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[engine]\ngeneration_timeout_ms = 500\nmax_concurrency = 2").unwrap();

        let config = TriptychConfig::from_file(file.path()).unwrap();
        assert_eq!(config.engine.generation_timeout_ms, 500);
        assert_eq!(config.engine.max_concurrency, Some(2));
        assert_eq!(config.engine.function_timeout_ms, 30_000);
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let err = TriptychConfig::from_file("/nonexistent/triptych.toml").unwrap_err();
        assert!(err.to_string().contains("Configuration Error"));
    }

    #[test]
    fn test_explicit_database_url_wins() {
        let settings = DatabaseSettings {
            url: Some("postgres://example/triptych".into()),
            pool_size: 2,
        };
        assert_eq!(
            settings.resolve_url().as_deref(),
            Some("postgres://example/triptych")
        );
    }
}
