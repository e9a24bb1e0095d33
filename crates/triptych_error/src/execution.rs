//! Execution error types.

/// Specific error conditions raised before or around a multi-variation run.
///
/// Per-variation failures are never reported through this type; they are
/// encoded in each variation's response status instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ExecutionErrorKind {
    /// The caller supplied no configurations
    #[display("at least one configuration required")]
    NoConfigurations,
    /// Two configurations share a variation name
    #[display("Duplicate variation name '{}' within execution run", _0)]
    DuplicateVariation(String),
    /// The caller supplied an invalid request field
    #[display("Invalid execution request: {}", _0)]
    InvalidRequest(String),
    /// The execution run record could not be set up
    #[display("Execution run setup failed: {}", _0)]
    RunSetup(String),
    /// No execution with the given identifier is known
    #[display("Execution '{}' not found", _0)]
    UnknownExecution(String),
    /// A status change that leaves a terminal state or skips a stage
    #[display("Invalid execution status transition from {} to {}", from, to)]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
    /// A background execution task terminated abnormally
    #[display("Execution task failed: {}", _0)]
    TaskFailed(String),
}

/// Error type for execution setup and lifecycle operations.
///
/// # Examples
///
/// ```
/// use triptych_error::{ExecutionError, ExecutionErrorKind};
///
/// let err = ExecutionError::new(ExecutionErrorKind::DuplicateVariation("fast".into()));
/// assert!(format!("{}", err).contains("fast"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Execution Error: {} at line {} in {}", kind, line, file)]
pub struct ExecutionError {
    /// The specific error condition
    pub kind: ExecutionErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ExecutionError {
    /// Create a new ExecutionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ExecutionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Returns true for errors caused by caller-supplied input.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self.kind,
            ExecutionErrorKind::NoConfigurations
                | ExecutionErrorKind::DuplicateVariation(_)
                | ExecutionErrorKind::InvalidRequest(_)
        )
    }
}
