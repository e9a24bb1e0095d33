//! Top-level error wrapper types.

#[cfg(feature = "database")]
use crate::DatabaseError;
use crate::{
    ComparisonError, ConfigError, ExecutionError, FunctionError, GenerationError,
    HttpError, JsonError, LoggerError,
};

/// Every error condition the Triptych crates can surface.
///
/// # Examples
///
/// ```
/// use triptych_error::{TriptychError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: TriptychError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TriptychErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Execution setup or lifecycle error
    #[from(ExecutionError)]
    Execution(ExecutionError),
    /// Comparison error
    #[from(ComparisonError)]
    Comparison(ComparisonError),
    /// Generation capability error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Function resolution error
    #[from(FunctionError)]
    Function(FunctionError),
    /// Execution logger error
    #[from(LoggerError)]
    Logger(LoggerError),
    /// Database error
    #[cfg(feature = "database")]
    #[from(DatabaseError)]
    Database(DatabaseError),
}

/// Triptych error with kind discrimination.
///
/// # Examples
///
/// ```
/// use triptych_error::{TriptychResult, ConfigError};
///
/// fn might_fail() -> TriptychResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Triptych Error: {}", _0)]
pub struct TriptychError(Box<TriptychErrorKind>);

impl TriptychError {
    /// Create a new error from a kind.
    pub fn new(kind: TriptychErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TriptychErrorKind {
        &self.0
    }

    /// Returns the generation error, if this is one.
    pub fn as_generation(&self) -> Option<&GenerationError> {
        match self.kind() {
            TriptychErrorKind::Generation(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the execution error, if this is one.
    pub fn as_execution(&self) -> Option<&ExecutionError> {
        match self.kind() {
            TriptychErrorKind::Execution(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the logger error, if this is one.
    pub fn as_logger(&self) -> Option<&LoggerError> {
        match self.kind() {
            TriptychErrorKind::Logger(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the comparison error, if this is one.
    pub fn as_comparison(&self) -> Option<&ComparisonError> {
        match self.kind() {
            TriptychErrorKind::Comparison(e) => Some(e),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to TriptychErrorKind
impl<T> From<T> for TriptychError
where
    T: Into<TriptychErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Triptych operations.
pub type TriptychResult<T> = std::result::Result<T, TriptychError>;
