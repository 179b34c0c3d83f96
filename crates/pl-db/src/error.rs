//! Error types for pl-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Unique or primary key constraint violated (D003)
    #[error("[D003] Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Mutex poisoned (D004)
    #[error("[D004] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

impl DbError {
    /// Whether this error is a uniqueness conflict rather than a failure of
    /// the statement or the connection.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error does not expose structured constraint variants, so
        // the message is the only thing to classify on.
        let msg = err.to_string();
        if is_unique_violation_message(&msg) {
            DbError::UniqueViolation(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}

/// Match DuckDB's duplicate-key constraint messages, e.g.
/// `Constraint Error: Duplicate key "identifier: 0001_init.sql" violates unique constraint.`
fn is_unique_violation_message(msg: &str) -> bool {
    msg.contains("Duplicate key")
        || msg.contains("violates unique constraint")
        || msg.contains("violates primary key constraint")
}
