//! Triptych: run one prompt across many model configurations side by side.
//!
//! Triptych issues the same base prompt to N named configurations
//! ("variations") concurrently, isolates each variation's failures, resolves
//! provider function calls against mock or live endpoints, logs every
//! request, response and function call, and optionally ranks the successful
//! variations by a chosen metric.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use triptych::{
//!     ApiConfiguration, EngineConfig, ExecuteRequest, GeminiGenerator, GeminiSettings,
//!     InMemoryExecutionLogger, MultiVariationExecutor,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let generator = GeminiGenerator::from_env(GeminiSettings::default())?;
//!     let executor = MultiVariationExecutor::new(
//!         Arc::new(generator),
//!         Arc::new(InMemoryExecutionLogger::new()),
//!         EngineConfig::default(),
//!     );
//!
//!     let request = ExecuteRequest::builder()
//!         .name("greeting")
//!         .prompt("Say hello")
//!         .configurations(vec![
//!             ApiConfiguration::builder().variation_name("cold").model_name("gemini-2.0-flash").temperature(0.1).build()?,
//!             ApiConfiguration::builder().variation_name("hot").model_name("gemini-2.0-flash").temperature(1.5).build()?,
//!         ])
//!         .build()?;
//!
//!     let result = executor.execute(request).await?;
//!     println!("{}", triptych::render_result(&result));
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `gemini` (default) - Google Gemini generation capability
//! - `database` - PostgreSQL execution logger
//! - `all` - Enable all features
//!
//! # Architecture
//!
//! - `triptych_error` - Error types
//! - `triptych_core` - Records: runs, configurations, requests, responses, results
//! - `triptych_interface` - Capability traits the engine consumes
//! - `triptych_functions` - Function registry and resolver
//! - `triptych_models` - Generation capability backends
//! - `triptych_executor` - Runner, executor, comparator and service
//! - `triptych_database` - PostgreSQL logger
//!
//! This crate re-exports everything for convenience.

mod settings;
mod observability;
mod plan;
mod summary;

// Re-export core crates (always available)
pub use triptych_core::*;
pub use triptych_error::*;
pub use triptych_executor::*;
pub use triptych_functions::*;
pub use triptych_interface::*;

#[cfg(feature = "gemini")]
pub use triptych_models::{
    DEFAULT_GEMINI_BASE_URL, GeminiGenerator, GeminiSettings, GeminiSettingsBuilder,
};

#[cfg(feature = "database")]
pub use triptych_database::{
    DEFAULT_POOL_SIZE, PgExecutionLogger, PgPool, establish_pool, run_migrations,
};

pub use settings::{DatabaseSettings, TriptychConfig};
pub use observability::{ObservabilityConfig, init_observability};
pub use plan::{CredentialGaps, ExecutionPlan, PlanRun};
pub use summary::{render_result, render_runs};
