//! Execution logger error types.

/// Execution logger error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum LoggerErrorKind {
    /// A record could not be written
    #[display("Failed to write {} record: {}", record, message)]
    WriteFailed {
        /// Record type (run, request, response, ...)
        record: String,
        /// Underlying failure
        message: String,
    },
    /// A record referenced by id does not exist
    #[display("{} record '{}' not found", record, id)]
    NotFound {
        /// Record type
        record: String,
        /// Record identity
        id: String,
    },
    /// The sink is not reachable at all
    #[display("Execution logger unavailable: {}", _0)]
    Unavailable(String),
}

impl LoggerErrorKind {
    /// Whether repeating the same write could succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, LoggerErrorKind::NotFound { .. })
    }
}

/// Execution logger error with source location tracking.
///
/// # Examples
///
/// ```
/// use triptych_error::{LoggerError, LoggerErrorKind};
///
/// let err = LoggerError::new(LoggerErrorKind::Unavailable("disk full".into()));
/// assert!(format!("{}", err).contains("disk full"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Logger Error: {} at line {} in {}", kind, line, file)]
pub struct LoggerError {
    /// The kind of error that occurred
    pub kind: LoggerErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl LoggerError {
    /// Create a new LoggerError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: LoggerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a failed write of the given record type.
    #[track_caller]
    pub fn write_failed(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LoggerErrorKind::WriteFailed {
            record: record.into(),
            message: message.into(),
        })
    }
}

impl crate::RetryableError for LoggerError {
    fn is_retryable(&self) -> bool {
        self.kind.is_transient()
    }

    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        (50, 3, 1)
    }
}
