//! Error types for the Triptych execution engine.
//!
//! This crate provides the foundation error types used throughout the Triptych workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use triptych_error::{ExecutionError, ExecutionErrorKind, TriptychResult};
//!
//! fn start() -> TriptychResult<()> {
//!     Err(ExecutionError::new(ExecutionErrorKind::NoConfigurations))?
//! }
//!
//! let err = start().unwrap_err();
//! assert!(err.to_string().contains("at least one configuration required"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod comparison;
#[cfg(feature = "database")]
mod database;
mod error;
mod execution;
mod function;
mod generation;
mod logger;
mod message;

pub use comparison::{ComparisonError, ComparisonErrorKind};
#[cfg(feature = "database")]
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{TriptychError, TriptychErrorKind, TriptychResult};
pub use execution::{ExecutionError, ExecutionErrorKind};
pub use function::{FunctionError, FunctionErrorKind};
pub use generation::{GenerationError, GenerationErrorKind, RetryableError};
pub use logger::{LoggerError, LoggerErrorKind};
pub use message::{ConfigError, HttpError, JsonError};
