//! Core data types for the Triptych multi-variation execution engine.
//!
//! This crate provides the records shared by every other Triptych crate:
//! execution runs and their lifecycle, API configurations (variations),
//! request/response/function-call records, and the aggregated results
//! produced by one execution.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod comparison;
mod configuration;
mod credentials;
mod execute;
mod function;
mod request;
mod response;
mod result;
mod run;

pub use comparison::{ComparisonConfig, ComparisonResult};
pub use configuration::{ApiConfiguration, ApiConfigurationBuilder};
pub use credentials::Credentials;
pub use execute::{ExecuteRequest, ExecuteRequestBuilder, ExecuteResponse, ExecutionStatusReport};
pub use function::{
    FunctionCallRecord, FunctionCallRequest, FunctionCallResult, FunctionCallStatus,
    FunctionDefinition, HttpMethod, ResolutionMode,
};
pub use request::{ApiRequest, RequestKind};
pub use response::{ApiResponse, ResponseStatus, UsageMetadata};
pub use result::{ExecutionResult, LogEntry, LogLevel, VariationResult};
pub use run::{ExecutionRun, RunStatus};
