//! Comparison error types.

/// Specific error conditions for comparing variation results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ComparisonErrorKind {
    /// Every variation failed, so there is nothing to rank
    #[display("no successful variations to compare")]
    NoSuccessfulVariations,
    /// The metric list was empty
    #[display("at least one comparison metric required")]
    NoMetrics,
    /// A metric name that no registered metric answers to
    #[display("Unknown comparison metric '{}'", _0)]
    UnknownMetric(String),
}

/// Comparison error with source location tracking.
///
/// # Examples
///
/// ```
/// use triptych_error::{ComparisonError, ComparisonErrorKind};
///
/// let err = ComparisonError::new(ComparisonErrorKind::NoSuccessfulVariations);
/// assert!(format!("{}", err).contains("no successful variations"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Comparison Error: {} at line {} in {}", kind, line, file)]
pub struct ComparisonError {
    /// The kind of error that occurred
    pub kind: ComparisonErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ComparisonError {
    /// Create a new ComparisonError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ComparisonErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
