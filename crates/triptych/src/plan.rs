//! Execution plan files: one run described in TOML.
//!
//! ```toml
//! [run]
//! name = "greeting"
//! prompt = "Say hello to the user"
//! context = "The user is a child"
//! function_calling_enabled = true
//!
//! [[variations]]
//! variation_name = "fast"
//! model_name = "gemini-2.0-flash"
//! temperature = 0.2
//!
//! [[variations]]
//! variation_name = "creative"
//! model_name = "gemini-2.0-flash"
//! temperature = 1.2
//!
//! [comparison]
//! enabled = true
//! metrics = ["latency", "response_length"]
//!
//! [[functions]]
//! name = "get_weather"
//! endpoint = "https://api.example.com/weather"
//! method = "GET"
//! required_api_keys = ["WEATHER_API_KEY"]
//! headers = { Authorization = "Bearer {{WEATHER_API_KEY}}" }
//! mock_response = { temperature = 21 }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};
use triptych_core::{
    ApiConfiguration, ComparisonConfig, Credentials, ExecuteRequest, FunctionDefinition,
    ResolutionMode,
};
use triptych_error::{ConfigError, TriptychResult};
use triptych_executor::{EngineConfig, MultiVariationExecutor};
use triptych_functions::{HttpFunctionResolver, InMemoryFunctionRegistry};
use triptych_interface::{ExecutionLogger, GenerationCapability};

/// Run-level fields of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRun {
    /// Run name
    pub name: String,
    /// Run description
    #[serde(default)]
    pub description: Option<String>,
    /// Base prompt
    pub prompt: String,
    /// Context appended after the prompt
    #[serde(default)]
    pub context: Option<String>,
    /// Resolve provider function-call requests
    #[serde(default)]
    pub function_calling_enabled: bool,
    /// Resolve every function call from its mock response
    #[serde(default)]
    pub use_mock: bool,
}

/// Functions whose required credentials are missing, by what will happen
/// when the model calls them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialGaps<'a> {
    /// `auto` functions, which resolve from their mock response instead
    pub mocked: Vec<&'a str>,
    /// `real` functions, which fail with a missing-key error
    pub failing: Vec<&'a str>,
}

impl CredentialGaps<'_> {
    /// Whether every function can run as declared.
    pub fn is_empty(&self) -> bool {
        self.mocked.is_empty() && self.failing.is_empty()
    }
}

/// A run, its variations, optional comparison and the functions the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Run metadata and prompt
    pub run: PlanRun,
    /// Variations in reporting order
    #[serde(default)]
    pub variations: Vec<ApiConfiguration>,
    /// Comparison of successful variations
    #[serde(default)]
    pub comparison: Option<ComparisonConfig>,
    /// Callable functions
    #[serde(default)]
    pub functions: Vec<FunctionDefinition>,
}

impl ExecutionPlan {
    /// Parse a plan from TOML text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the text is not a valid plan.
    pub fn from_toml_str(text: &str) -> TriptychResult<Self> {
        Ok(toml::from_str(text)
            .map_err(|e| ConfigError::new(format!("Invalid execution plan: {e}")))?)
    }

    /// Read and parse a plan file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> TriptychResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::new(format!("Failed to read plan {}: {e}", path.display()))
        })?;
        let plan = Self::from_toml_str(&text)?;
        debug!(
            variations = plan.variations.len(),
            functions = plan.functions.len(),
            "Loaded execution plan"
        );
        Ok(plan)
    }

    /// Every credential name some function requires, deduplicated and sorted.
    pub fn required_api_keys(&self) -> BTreeSet<&str> {
        self.functions
            .iter()
            .flat_map(|f| f.required_api_keys.iter().map(String::as_str))
            .collect()
    }

    /// Credentials for [`ExecutionPlan::required_api_keys`] read from
    /// same-named environment variables. Unset variables are left out.
    pub fn credentials_from_env(&self) -> Credentials {
        Credentials::from_env(self.required_api_keys())
    }

    /// Functions that lack a required credential in `credentials`.
    ///
    /// `mock` functions never need credentials, and `force_mock` turns every
    /// function into one.
    pub fn credential_gaps<'a>(
        &'a self,
        credentials: &Credentials,
        force_mock: bool,
    ) -> CredentialGaps<'a> {
        let mut gaps = CredentialGaps::default();
        if force_mock || self.run.use_mock {
            return gaps;
        }
        for function in &self.functions {
            let missing = function
                .required_api_keys
                .iter()
                .any(|key| !credentials.contains(key));
            if !missing {
                continue;
            }
            match function.mode {
                ResolutionMode::Auto => gaps.mocked.push(function.name.as_str()),
                ResolutionMode::Real => gaps.failing.push(function.name.as_str()),
                ResolutionMode::Mock => {}
            }
        }
        gaps
    }

    /// Registry over the plan's functions.
    pub fn registry(&self) -> InMemoryFunctionRegistry {
        self.functions.iter().cloned().collect()
    }

    /// The execution request this plan describes.
    ///
    /// `force_mock` overrides the plan's own `use_mock` when set.
    pub fn to_request(&self, force_mock: bool, credentials: Credentials) -> ExecuteRequest {
        ExecuteRequest {
            name: self.run.name.clone(),
            description: self.run.description.clone(),
            prompt: self.run.prompt.clone(),
            context: self.run.context.clone(),
            function_calling_enabled: self.run.function_calling_enabled,
            configurations: self.variations.clone(),
            comparison: self.comparison.clone(),
            use_mock: force_mock || self.run.use_mock,
            credentials,
        }
    }

    /// Executor wired with a resolver over the plan's functions.
    pub fn executor(
        &self,
        generator: Arc<dyn GenerationCapability>,
        logger: Arc<dyn ExecutionLogger>,
        config: EngineConfig,
    ) -> MultiVariationExecutor {
        let resolver = HttpFunctionResolver::new(Arc::new(self.registry()))
            .with_timeout(config.function_timeout());
        MultiVariationExecutor::new(generator, logger, config).with_resolver(Arc::new(resolver))
    }
}
