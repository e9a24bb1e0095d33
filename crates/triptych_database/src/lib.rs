//! PostgreSQL persistence for Triptych execution runs.
//!
//! [`PgExecutionLogger`] implements the engine's `ExecutionLogger` over six
//! tables (`execution_runs`, `api_configurations`, `api_requests`,
//! `api_responses`, `function_calls`, `comparison_results`). Migrations are
//! embedded and applied by [`PgExecutionLogger::connect`] or
//! [`run_migrations`].
//!
//! # Example
//!
//! ```rust,ignore
//! use triptych_database::{PgExecutionLogger, database_url_from_env};
//!
//! let logger = PgExecutionLogger::connect(&database_url_from_env()?)?;
//! ```

#![forbid(unsafe_code)]

mod connection;
mod logger;
mod models;

pub mod schema;

pub use connection::{
    DEFAULT_POOL_SIZE, PgPool, database_url_from_env, establish_pool, run_migrations,
};
pub use logger::PgExecutionLogger;
pub use models::{
    ExecutionRunRow, NewApiConfigurationRow, NewApiRequestRow, NewApiResponseRow,
    NewComparisonRow, NewFunctionCallRow,
};

use triptych_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
