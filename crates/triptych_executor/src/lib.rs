//! Multi-variation execution engine for Triptych.
//!
//! Given one base prompt and N [`ApiConfiguration`](triptych_core::ApiConfiguration)s,
//! the [`MultiVariationExecutor`] runs every variation concurrently through a
//! [`VariationRunner`], isolates per-variation failures, aggregates counts and
//! timings, and optionally ranks the successful variations with the
//! [`ResultComparator`]. Every run, configuration, request, response and
//! function call is written to an [`ExecutionLogger`](triptych_interface::ExecutionLogger)
//! as it happens.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use triptych_core::{ApiConfiguration, ExecuteRequest};
//! use triptych_executor::{EngineConfig, InMemoryExecutionLogger, MultiVariationExecutor};
//! # use triptych_interface::GenerationCapability;
//!
//! # async fn example(generator: Arc<dyn GenerationCapability>) -> Result<(), Box<dyn std::error::Error>> {
//! let logger = Arc::new(InMemoryExecutionLogger::new());
//! let executor = MultiVariationExecutor::new(generator, logger, EngineConfig::default());
//!
//! let request = ExecuteRequest::builder()
//!     .name("greeting")
//!     .prompt("Say hello")
//!     .configurations(vec![
//!         ApiConfiguration::builder().variation_name("fast").model_name("gemini-2.0-flash").temperature(0.2).build()?,
//!         ApiConfiguration::builder().variation_name("creative").model_name("gemini-2.0-flash").temperature(0.9).build()?,
//!     ])
//!     .build()?;
//!
//! let result = executor.execute(request).await?;
//! println!("{} succeeded, {} failed", result.success_count, result.error_count);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod comparator;
mod config;
mod executor;
mod in_memory_logger;
mod log_writer;
mod metrics;
mod prompt;
mod runner;
mod service;

pub use comparator::ResultComparator;
pub use config::{EngineConfig, EngineConfigBuilder};
pub use executor::{MultiVariationExecutor, PreparedExecution};
pub use in_memory_logger::InMemoryExecutionLogger;
pub use log_writer::LogWriter;
pub use metrics::{
    FunctionSuccessRate, LexicalDiversity, Metric, MetricRegistry, ResponseLatency,
    ResponseLength, TokenEfficiency, TotalTime,
};
pub use prompt::compose_prompt;
pub use runner::{VariationInput, VariationRunner};
pub use service::ExecutionService;
