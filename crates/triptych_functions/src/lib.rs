//! Function-call resolution for the Triptych execution engine.
//!
//! A provider may ask the caller to execute a named function before it
//! finishes generating. This crate resolves such calls either from a recorded
//! mock payload or by calling the function's registered HTTP endpoint.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use triptych_core::{Credentials, FunctionCallRequest, FunctionDefinition};
//! use triptych_functions::{HttpFunctionResolver, InMemoryFunctionRegistry};
//! use triptych_interface::{FunctionInvocation, FunctionResolver};
//!
//! # async fn example() {
//! let registry = InMemoryFunctionRegistry::new()
//!     .with(FunctionDefinition::mock("get_weather", json!({"temp": 21})));
//! let resolver = HttpFunctionResolver::new(Arc::new(registry));
//!
//! let call = FunctionCallRequest::new("get_weather", json!({"city": "Oslo"}));
//! let credentials = Credentials::new();
//! let result = resolver.resolve(FunctionInvocation::new(&call, &credentials)).await;
//! assert!(result.used_mock_data);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod placeholder;
mod registry;
mod resolver;

pub use placeholder::substitute_credentials;
pub use registry::InMemoryFunctionRegistry;
pub use resolver::{DEFAULT_FUNCTION_TIMEOUT, HttpFunctionResolver};
