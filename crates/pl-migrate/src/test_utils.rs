//! Shared helpers for engine unit tests.

use async_trait::async_trait;
use pl_db::{Database, DbResult, DuckDbBackend, Row};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

/// DuckDB backend that records every statement batch it is asked to run.
pub(crate) struct RecordingDb {
    inner: DuckDbBackend,
    batches: Mutex<Vec<String>>,
}

impl RecordingDb {
    pub(crate) fn new() -> Self {
        Self {
            inner: DuckDbBackend::in_memory().unwrap(),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Batches submitted so far, in order
    pub(crate) fn batches(&self) -> Vec<String> {
        self.batches.lock().unwrap().clone()
    }

    /// Whether any submitted batch equals `body`
    pub(crate) fn submitted(&self, body: &str) -> bool {
        self.batches.lock().unwrap().iter().any(|b| b == body)
    }
}

#[async_trait]
impl Database for RecordingDb {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.inner.execute(sql).await
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.batches.lock().unwrap().push(sql.to_string());
        self.inner.execute_batch(sql).await
    }

    async fn execute_params(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        self.inner.execute_params(sql, params).await
    }

    async fn query_count(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        self.inner.query_count(sql, params).await
    }

    async fn query_rows(
        &self,
        sql: &str,
        params: &[&str],
        columns: usize,
    ) -> DbResult<Vec<Row>> {
        self.inner.query_rows(sql, params, columns).await
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.inner.relation_exists(name).await
    }

    fn db_type(&self) -> &'static str {
        "recording"
    }
}

/// Write a script file below `root`, creating parent directories.
pub(crate) fn write_script(root: &Path, name: &str, body: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
}
