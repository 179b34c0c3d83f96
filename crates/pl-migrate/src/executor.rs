//! Migration executor: drives one run from discovery to completion or the
//! first failure.
//!
//! Scripts are applied strictly in ascending identifier order, one at a time.
//! The first error aborts the run; scripts recorded before it stay applied
//! and nothing is rolled back beyond the failing script's own transaction.

use crate::context::RunContext;
use crate::error::{MigrateError, MigrateResult};
use crate::ledger::Ledger;
use crate::source::{ChangeScript, MigrationSource};
use pl_core::{ChecksumPolicy, MigrationsConfig, ScriptId, TransactionMode};
use pl_db::Database;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Scripts applied by this run, in application order
    pub applied: Vec<ScriptId>,
    /// Scripts that already had a ledger row
    pub skipped: Vec<ScriptId>,
    /// Wall time of the whole run
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunReport {
    /// Whether the run changed nothing
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Per-script progress, emitted as log records for operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent<'a> {
    Applied {
        identifier: &'a ScriptId,
        elapsed: Duration,
    },
    Skipped {
        identifier: &'a ScriptId,
    },
    Failed {
        identifier: &'a ScriptId,
        error: String,
    },
}

impl RunEvent<'_> {
    fn emit(&self) {
        match self {
            RunEvent::Applied {
                identifier,
                elapsed,
            } => log::info!(
                "Migration {identifier} applied ({}ms)",
                elapsed.as_millis()
            ),
            RunEvent::Skipped { identifier } => {
                log::info!("Migration {identifier} already applied, skipping")
            }
            RunEvent::Failed { identifier, error } => {
                log::error!("Migration {identifier} failed: {error}")
            }
        }
    }
}

/// Runs change-scripts from a directory against a database.
#[derive(Debug, Clone, Default)]
pub struct Migrator {
    config: MigrationsConfig,
}

impl Migrator {
    /// Create a migrator, rejecting invalid settings up front.
    pub fn new(config: MigrationsConfig) -> MigrateResult<Self> {
        config.validate().map_err(MigrateError::Config)?;
        Ok(Self { config })
    }

    /// Settings this migrator runs with
    pub fn config(&self) -> &MigrationsConfig {
        &self.config
    }

    /// Ledger view over `db` using the configured table
    pub fn ledger<'a>(&self, db: &'a dyn Database) -> Ledger<'a> {
        Ledger::new(db, self.config.ledger_table.as_str()).with_lock_ttl(self.config.lock_ttl())
    }

    /// Source over `root` using the configured suffix
    pub fn source(&self, root: &Path) -> MigrationSource {
        MigrationSource::new(root, self.config.suffix.as_str())
    }

    /// Apply every pending script under `root`.
    ///
    /// Succeeds only if each discovered script ends up applied, either by
    /// this run or an earlier one. When locking is enabled the ledger lock is
    /// held from before discovery until the run finishes, on success and on
    /// failure alike.
    pub async fn run(
        &self,
        ctx: &RunContext,
        db: &dyn Database,
        root: &Path,
    ) -> MigrateResult<RunReport> {
        let started = Instant::now();
        ctx.check()?;

        let ledger = self.ledger(db);
        ledger.ensure_schema().await?;

        let mut report = if self.config.lock {
            let holder = lock_holder_id();
            ledger.acquire_lock(&holder).await?;
            let result = self.apply_pending(ctx, db, &ledger, root).await;
            let released = ledger.release_lock(&holder).await;
            match (result, released) {
                (Ok(report), Ok(())) => report,
                (Ok(_), Err(release_err)) => return Err(release_err),
                (Err(e), Ok(())) => return Err(e),
                (Err(e), Err(release_err)) => {
                    log::warn!("Failed to release migration lock after error: {release_err}");
                    return Err(e);
                }
            }
        } else {
            self.apply_pending(ctx, db, &ledger, root).await?
        };

        report.elapsed = started.elapsed();
        log::info!(
            "Migrations complete: {} applied, {} skipped",
            report.applied.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    async fn apply_pending(
        &self,
        ctx: &RunContext,
        db: &dyn Database,
        ledger: &Ledger<'_>,
        root: &Path,
    ) -> MigrateResult<RunReport> {
        let scripts = self.source(root).discover()?;
        let mut report = RunReport::default();

        for script in &scripts {
            ctx.check()?;

            if ledger.is_applied(&script.id).await? {
                self.verify_checksum(ledger, script).await?;
                RunEvent::Skipped {
                    identifier: &script.id,
                }
                .emit();
                report.skipped.push(script.id.clone());
                continue;
            }

            let started = Instant::now();
            log::debug!("Applying migration {}", script.id);
            if let Err(e) = self.apply_one(db, ledger, script).await {
                RunEvent::Failed {
                    identifier: &script.id,
                    error: e.to_string(),
                }
                .emit();
                return Err(e);
            }
            RunEvent::Applied {
                identifier: &script.id,
                elapsed: started.elapsed(),
            }
            .emit();
            report.applied.push(script.id.clone());
        }

        Ok(report)
    }

    /// Execute one script's body and record it.
    ///
    /// A body that issues its own `BEGIN`/`COMMIT`/`ROLLBACK` would end the
    /// wrapping transaction early, so it runs unwrapped and its ledger row is
    /// written only after the whole body succeeds.
    async fn apply_one(
        &self,
        db: &dyn Database,
        ledger: &Ledger<'_>,
        script: &ChangeScript,
    ) -> MigrateResult<()> {
        match self.config.transaction {
            TransactionMode::None => execute_and_record(db, ledger, script).await,
            TransactionMode::PerScript if script.manages_transaction() => {
                log::warn!(
                    "Migration {} controls its own transaction; applying it without the per-script transaction",
                    script.id
                );
                execute_and_record(db, ledger, script).await
            }
            TransactionMode::PerScript => {
                let script_error = |source| MigrateError::ScriptExecution {
                    identifier: script.id.clone(),
                    source,
                };

                db.begin().await.map_err(script_error)?;
                let result = execute_and_record(db, ledger, script).await;

                match result {
                    Ok(()) => {
                        if let Err(commit_err) = db.commit().await {
                            let _ = db.rollback().await;
                            return Err(script_error(commit_err));
                        }
                        Ok(())
                    }
                    Err(e) => {
                        if let Err(rollback_err) = db.rollback().await {
                            log::warn!("Rollback of {} failed: {rollback_err}", script.id);
                        }
                        Err(e)
                    }
                }
            }
        }
    }

    /// Compare an applied script's body against its recorded checksum.
    ///
    /// The body is never re-submitted, whatever the outcome.
    async fn verify_checksum(
        &self,
        ledger: &Ledger<'_>,
        script: &ChangeScript,
    ) -> MigrateResult<()> {
        if self.config.checksum == ChecksumPolicy::Ignore {
            return Ok(());
        }
        let Some(recorded) = ledger.entry(&script.id).await?.and_then(|e| e.checksum) else {
            return Ok(());
        };
        let current = script.checksum();
        if recorded == current {
            return Ok(());
        }

        match self.config.checksum {
            ChecksumPolicy::Strict => Err(MigrateError::ChecksumMismatch {
                identifier: script.id.clone(),
                recorded,
                current,
            }),
            _ => {
                log::warn!(
                    "Migration {} was modified after it was applied (recorded checksum {}, current {}); the change will not be applied",
                    script.id,
                    recorded,
                    current
                );
                Ok(())
            }
        }
    }
}

async fn execute_and_record(
    db: &dyn Database,
    ledger: &Ledger<'_>,
    script: &ChangeScript,
) -> MigrateResult<()> {
    db.execute_batch(&script.body)
        .await
        .map_err(|source| MigrateError::ScriptExecution {
            identifier: script.id.clone(),
            source,
        })?;
    ledger.record_applied(&script.id, &script.checksum()).await
}

/// Unique owner tag for the run lock.
fn lock_holder_id() -> String {
    format!("{}-{}", std::process::id(), uuid::Uuid::new_v4())
}

/// Apply every pending `.sql` script under `root` with default settings.
///
/// This is the entry point for hosts that migrate once at startup; any error
/// should abort startup.
pub async fn run(ctx: &RunContext, db: &dyn Database, root: &Path) -> MigrateResult<RunReport> {
    Migrator::default().run(ctx, db, root).await
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
