//! Function resolution error types.
//!
//! The resolver never returns these to its caller; it renders them into the
//! `error_details` of a function call result. They exist so that every failure
//! path produces a consistently worded message.

/// Function resolution error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum FunctionErrorKind {
    /// No definition is registered under the name
    #[display("function '{}' is not registered", _0)]
    NotRegistered(String),
    /// Mock mode requested without a recorded mock payload
    #[display("no mock response registered for function '{}'", _0)]
    NoMockResponse(String),
    /// Real mode requested without an endpoint
    #[display("function '{}' has no endpoint configured", _0)]
    NoEndpoint(String),
    /// One or more declared API keys are absent from the session credentials
    #[display("missing required API key(s): {}", _0)]
    MissingApiKeys(String),
    /// The declared HTTP method is not supported
    #[display("unsupported HTTP method '{}'", _0)]
    UnsupportedMethod(String),
    /// The endpoint did not answer within the per-call timeout
    #[display("function call timed out after {}ms", _0)]
    Timeout(u64),
    /// Transport-level failure reaching the endpoint
    #[display("function call request failed: {}", _0)]
    Transport(String),
    /// The endpoint answered with a non-success status
    #[display("function endpoint returned HTTP {}: {}", status_code, message)]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Response body
        message: String,
    },
    /// Resolution was abandoned because the execution was cancelled
    #[display("execution cancelled")]
    Cancelled,
}

/// Function resolution error with source location tracking.
///
/// # Examples
///
/// ```
/// use triptych_error::{FunctionError, FunctionErrorKind};
///
/// let err = FunctionError::new(FunctionErrorKind::MissingApiKeys("WEATHER_KEY".into()));
/// assert_eq!(err.kind.to_string(), "missing required API key(s): WEATHER_KEY");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Function Error: {} at line {} in {}", kind, line, file)]
pub struct FunctionError {
    /// The kind of error that occurred
    pub kind: FunctionErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl FunctionError {
    /// Create a new FunctionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: FunctionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
