//! Capability traits for the Triptych execution engine.
//!
//! The executor depends only on the traits defined here. Concrete backends
//! (a Gemini generator, a Postgres logger, an HTTP function resolver) live in
//! their own crates and are passed into the executor by reference.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ExecutionLogger, FunctionRegistry, FunctionResolver, GenerationCapability};
pub use types::{FunctionInvocation, GenerationOutput, GenerationOutputBuilder};
