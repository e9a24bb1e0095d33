//! Postgres persistence errors.

/// Failure classes of the Postgres execution log.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum DatabaseErrorKind {
    /// The server rejected or never answered the connection
    #[display("cannot connect to Postgres: {}", _0)]
    Connection(String),
    /// No pooled connection became available
    #[display("connection pool exhausted or broken: {}", _0)]
    Pool(String),
    /// Embedded schema migrations did not apply
    #[display("schema migration failed: {}", _0)]
    Migration(String),
    /// A statement failed on the server
    #[display("query failed: {}", _0)]
    Query(String),
    /// A stored row cannot be turned back into a record
    #[display("corrupt row in {}: {}", table, reason)]
    CorruptRow {
        /// Table the row came from
        table: &'static str,
        /// What was wrong with it
        reason: String,
    },
    /// The statement matched no row
    #[display("no matching row")]
    NotFound,
}

/// Postgres persistence error with the location that raised it.
///
/// ```
/// use triptych_error::{DatabaseError, DatabaseErrorKind};
///
/// let err = DatabaseError::new(DatabaseErrorKind::Migration("relation exists".into()));
/// assert!(err.to_string().contains("schema migration failed"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Database Error: {} at line {} in {}", kind, line, file)]
pub struct DatabaseError {
    /// Failure class
    pub kind: DatabaseErrorKind,
    /// Line where the error was created
    pub line: u32,
    /// File where the error was created
    pub file: &'static str,
}

impl DatabaseError {
    /// Create the error at the caller's location.
    #[track_caller]
    pub fn new(kind: DatabaseErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// A row in `table` that cannot be decoded.
    #[track_caller]
    pub fn corrupt_row(table: &'static str, reason: impl Into<String>) -> Self {
        Self::new(DatabaseErrorKind::CorruptRow {
            table,
            reason: reason.into(),
        })
    }

    /// Whether the statement simply matched nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::NotFound)
    }
}

impl From<diesel::result::Error> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::new(DatabaseErrorKind::NotFound),
            other => Self::new(DatabaseErrorKind::Query(other.to_string())),
        }
    }
}

impl From<diesel::ConnectionError> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(DatabaseErrorKind::Connection(err.to_string()))
    }
}

impl From<serde_json::Error> for DatabaseError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::corrupt_row("comparison_results", format!("scores not encodable: {err}"))
    }
}

/// Statement failures inside a logger transaction are write failures.
impl From<diesel::result::Error> for crate::LoggerError {
    fn from(err: diesel::result::Error) -> Self {
        crate::LoggerError::write_failed("database", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diesel_not_found_maps_to_not_found() {
        let err = DatabaseError::from(diesel::result::Error::NotFound);
        assert!(err.is_not_found());
        assert!(err.file.ends_with("database.rs"));
    }

    #[test]
    fn test_corrupt_row_names_table() {
        let err = DatabaseError::corrupt_row("execution_runs", "unknown run status 'paused'");
        assert_eq!(
            err.kind.to_string(),
            "corrupt row in execution_runs: unknown run status 'paused'"
        );
    }
}
