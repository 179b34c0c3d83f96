//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// One result row, every column rendered as text (`None` for SQL `NULL`).
pub type Row = Vec<Option<String>>;

/// Database abstraction trait for Plinth
///
/// This is the only surface the migration engine needs from a target
/// database: raw statement batches, parameterised single statements, scalar
/// and row queries, and transaction control. Implementations must be
/// Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a single SQL statement, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements as one batch
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute a single statement with positional `?` string parameters
    async fn execute_params(&self, sql: &str, params: &[&str]) -> DbResult<usize>;

    /// Count the rows produced by a query with positional `?` parameters
    async fn query_count(&self, sql: &str, params: &[&str]) -> DbResult<usize>;

    /// Run a query and return its first `columns` columns as text
    ///
    /// Callers cast non-text columns in SQL (`CAST(x AS VARCHAR)`).
    async fn query_rows(&self, sql: &str, params: &[&str], columns: usize)
        -> DbResult<Vec<Row>>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Open an explicit transaction
    async fn begin(&self) -> DbResult<()> {
        self.execute_batch("BEGIN TRANSACTION").await
    }

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()> {
        self.execute_batch("COMMIT").await
    }

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()> {
        self.execute_batch("ROLLBACK").await
    }

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
