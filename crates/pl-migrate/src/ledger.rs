//! Migration ledger: the persisted record of applied change-scripts.
//!
//! The ledger is a single append-only table keyed by script identifier.
//! Idempotency rests on its `UNIQUE` constraint rather than on any in-process
//! state, so every run re-reads it. A one-row companion table serves as the
//! run lock. A lock taken with a lease records when it expires; once that
//! time has passed the row may be reclaimed by the next run, so a crashed
//! holder does not block migrations forever.

use crate::error::{MigrateError, MigrateResult};
use pl_core::ScriptId;
use pl_db::{Database, DbError, Row};
use serde::Serialize;
use std::time::Duration;

/// One applied change-script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Surrogate key; increases in application order
    pub id: i64,
    /// Identifier of the applied script
    pub identifier: ScriptId,
    /// SHA-256 of the body at apply time, absent for rows written without one
    pub checksum: Option<String>,
    /// Store-assigned insertion time, rendered by the database
    pub applied_at: String,
}

/// Current owner of the run lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockInfo {
    pub holder: String,
    pub acquired_at: String,
}

/// Ledger stored in `table` (and `<table>_lock`) of the target database.
pub struct Ledger<'a> {
    db: &'a dyn Database,
    table: String,
    lock_ttl: Option<Duration>,
}

impl<'a> Ledger<'a> {
    /// `table` must be a plain SQL identifier; see
    /// [`MigrationsConfig::validate`](pl_core::MigrationsConfig::validate).
    pub fn new(db: &'a dyn Database, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
            lock_ttl: None,
        }
    }

    /// Lease length stamped on locks this ledger acquires
    ///
    /// `None` (the default) takes a lock that never expires.
    pub fn with_lock_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.lock_ttl = ttl;
        self
    }

    /// Name of the ledger table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Name of the single-row lock table
    pub fn lock_table(&self) -> String {
        format!("{}_lock", self.table)
    }

    /// Create the ledger, its id sequence, and the lock table if missing.
    pub async fn ensure_schema(&self) -> MigrateResult<()> {
        let table = &self.table;
        let lock_table = self.lock_table();
        let ddl = format!(
            "CREATE SEQUENCE IF NOT EXISTS {table}_id_seq START 1;
             CREATE TABLE IF NOT EXISTS {table} (
                 id         BIGINT PRIMARY KEY DEFAULT nextval('{table}_id_seq'),
                 identifier VARCHAR NOT NULL UNIQUE,
                 checksum   VARCHAR,
                 applied_at TIMESTAMPTZ NOT NULL DEFAULT current_timestamp
             );
             CREATE TABLE IF NOT EXISTS {lock_table} (
                 id          INTEGER PRIMARY KEY CHECK (id = 1),
                 holder      VARCHAR NOT NULL,
                 acquired_at TIMESTAMPTZ NOT NULL DEFAULT current_timestamp,
                 expires_at  BIGINT
             );"
        );
        self.db
            .execute_batch(&ddl)
            .await
            .map_err(MigrateError::LedgerWrite)
    }

    /// Whether `identifier` has a ledger row.
    pub async fn is_applied(&self, identifier: &ScriptId) -> MigrateResult<bool> {
        let count = self
            .db
            .query_count(
                &format!("SELECT 1 FROM {} WHERE identifier = ?", self.table),
                &[identifier.as_str()],
            )
            .await
            .map_err(MigrateError::LedgerRead)?;
        Ok(count > 0)
    }

    /// The ledger row for `identifier`, if any.
    pub async fn entry(&self, identifier: &ScriptId) -> MigrateResult<Option<LedgerEntry>> {
        let sql = format!("{} WHERE identifier = ?", self.select_entries());
        let rows = self
            .db
            .query_rows(&sql, &[identifier.as_str()], 4)
            .await
            .map_err(MigrateError::LedgerRead)?;
        rows.into_iter().next().map(parse_entry).transpose()
    }

    /// Every ledger row in application order.
    pub async fn entries(&self) -> MigrateResult<Vec<LedgerEntry>> {
        let sql = format!("{} ORDER BY id", self.select_entries());
        let rows = self
            .db
            .query_rows(&sql, &[], 4)
            .await
            .map_err(MigrateError::LedgerRead)?;
        rows.into_iter().map(parse_entry).collect()
    }

    fn select_entries(&self) -> String {
        format!(
            "SELECT CAST(id AS VARCHAR), identifier, checksum, CAST(applied_at AS VARCHAR) FROM {}",
            self.table
        )
    }

    /// Insert the ledger row for a freshly applied script.
    ///
    /// A uniqueness conflict means another writer recorded the same
    /// identifier first and surfaces as [`MigrateError::DuplicateEntry`].
    pub async fn record_applied(
        &self,
        identifier: &ScriptId,
        checksum: &str,
    ) -> MigrateResult<()> {
        let sql = format!(
            "INSERT INTO {} (identifier, checksum) VALUES (?, ?)",
            self.table
        );
        match self
            .db
            .execute_params(&sql, &[identifier.as_str(), checksum])
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_unique_violation() => Err(MigrateError::DuplicateEntry {
                identifier: identifier.clone(),
            }),
            Err(e) => Err(MigrateError::LedgerWrite(e)),
        }
    }

    /// Take the run lock for `holder`.
    ///
    /// A lock whose lease has run out is reclaimed first, with a warning.
    /// Fails with [`MigrateError::LockHeld`] while any other holder owns a
    /// live lock.
    pub async fn acquire_lock(&self, holder: &str) -> MigrateResult<()> {
        let held = match self.insert_lock(holder).await {
            Err(held @ MigrateError::LockHeld { .. }) => held,
            other => return other,
        };
        if !self.reclaim_expired_lock().await? {
            return Err(held);
        }
        self.insert_lock(holder).await
    }

    async fn insert_lock(&self, holder: &str) -> MigrateResult<()> {
        let lock_table = self.lock_table();
        let result = match self.lock_ttl {
            Some(ttl) => {
                let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
                let expires_at = unix_now().saturating_add(ttl_secs).to_string();
                let sql = format!(
                    "INSERT INTO {lock_table} (id, holder, expires_at) VALUES (1, ?, CAST(? AS BIGINT))"
                );
                self.db.execute_params(&sql, &[holder, expires_at.as_str()]).await
            }
            None => {
                let sql = format!("INSERT INTO {lock_table} (id, holder) VALUES (1, ?)");
                self.db.execute_params(&sql, &[holder]).await
            }
        };
        match result {
            Ok(_) => {
                log::debug!("Acquired migration lock as {holder}");
                Ok(())
            }
            Err(e) if e.is_unique_violation() => {
                let current = self.lock_holder().await?;
                Err(match current {
                    Some(info) => MigrateError::LockHeld {
                        holder: info.holder,
                        acquired_at: info.acquired_at,
                    },
                    // Released between our insert and the read.
                    None => MigrateError::LockHeld {
                        holder: "unknown".to_string(),
                        acquired_at: "unknown".to_string(),
                    },
                })
            }
            Err(e) => Err(MigrateError::LedgerWrite(e)),
        }
    }

    /// Delete the lock row if its lease has expired; `true` if one was removed.
    ///
    /// Locks taken without a lease are never reclaimed here.
    pub async fn reclaim_expired_lock(&self) -> MigrateResult<bool> {
        let stale = self.lock_holder().await?;
        let now = unix_now().to_string();
        let sql = format!(
            "DELETE FROM {} WHERE id = 1 AND expires_at IS NOT NULL AND expires_at < CAST(? AS BIGINT)",
            self.lock_table()
        );
        let removed = self
            .db
            .execute_params(&sql, &[now.as_str()])
            .await
            .map_err(MigrateError::LedgerWrite)?;
        if removed == 0 {
            return Ok(false);
        }
        if let Some(info) = stale {
            log::warn!(
                "Reclaimed expired migration lock held by {} since {}",
                info.holder,
                info.acquired_at
            );
        }
        Ok(true)
    }

    /// Release the run lock if `holder` owns it.
    pub async fn release_lock(&self, holder: &str) -> MigrateResult<()> {
        let sql = format!("DELETE FROM {} WHERE holder = ?", self.lock_table());
        let released = self
            .db
            .execute_params(&sql, &[holder])
            .await
            .map_err(MigrateError::LedgerWrite)?;
        if released == 0 {
            log::warn!("Migration lock was not held by {holder} at release");
        } else {
            log::debug!("Released migration lock held by {holder}");
        }
        Ok(())
    }

    /// Drop the run lock regardless of owner, returning the previous holder.
    ///
    /// Only for clearing a lock left behind by a crashed run.
    pub async fn force_release_lock(&self) -> MigrateResult<Option<LockInfo>> {
        let previous = self.lock_holder().await?;
        self.db
            .execute(&format!("DELETE FROM {}", self.lock_table()))
            .await
            .map_err(MigrateError::LedgerWrite)?;
        Ok(previous)
    }

    /// Current lock owner, if any.
    pub async fn lock_holder(&self) -> MigrateResult<Option<LockInfo>> {
        let sql = format!(
            "SELECT holder, CAST(acquired_at AS VARCHAR) FROM {} WHERE id = 1",
            self.lock_table()
        );
        let rows = self
            .db
            .query_rows(&sql, &[], 2)
            .await
            .map_err(MigrateError::LedgerRead)?;
        Ok(rows.into_iter().next().map(|row| {
            let mut cols = row.into_iter();
            LockInfo {
                holder: cols.next().flatten().unwrap_or_default(),
                acquired_at: cols.next().flatten().unwrap_or_default(),
            }
        }))
    }
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Convert a `(id, identifier, checksum, applied_at)` text row.
fn parse_entry(row: Row) -> MigrateResult<LedgerEntry> {
    let malformed = |what: &str| {
        MigrateError::LedgerRead(DbError::ExecutionError(format!(
            "malformed ledger row: {what}"
        )))
    };
    let mut cols = row.into_iter();
    let id = cols
        .next()
        .flatten()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| malformed("id"))?;
    let identifier = cols
        .next()
        .flatten()
        .and_then(ScriptId::try_new)
        .ok_or_else(|| malformed("identifier"))?;
    let checksum = cols.next().flatten();
    let applied_at = cols.next().flatten().unwrap_or_default();
    Ok(LedgerEntry {
        id,
        identifier,
        checksum,
        applied_at,
    })
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
