//! Error types for the migration engine.

use pl_core::{CoreError, ScriptId};
use pl_db::DbError;
use thiserror::Error;

/// Migration engine errors.
///
/// None of these are retried internally; the first one aborts the run.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Migrations location missing or unreadable (MG001).
    #[error("[MG001] Failed to discover migrations in '{path}': {source}")]
    Discovery {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Ledger query failed (MG002).
    #[error("[MG002] Failed to read migration ledger")]
    LedgerRead(#[source] DbError),

    /// Ledger DDL, insert, or lock write failed (MG003).
    #[error("[MG003] Failed to write migration ledger")]
    LedgerWrite(#[source] DbError),

    /// Another writer already recorded this identifier (MG004).
    #[error("[MG004] Migration {identifier} was already recorded by a concurrent run")]
    DuplicateEntry { identifier: ScriptId },

    /// The database rejected a change-script (MG005).
    #[error("[MG005] Migration {identifier} failed")]
    ScriptExecution {
        identifier: ScriptId,
        #[source]
        source: DbError,
    },

    /// An applied script was edited after it was recorded (MG006).
    #[error(
        "[MG006] Migration {identifier} changed after it was applied: recorded checksum {recorded}, current {current}"
    )]
    ChecksumMismatch {
        identifier: ScriptId,
        recorded: String,
        current: String,
    },

    /// Another run holds the ledger lock (MG007).
    #[error("[MG007] Migration lock is held by {holder} since {acquired_at}")]
    LockHeld { holder: String, acquired_at: String },

    /// The caller's deadline passed or the run was cancelled (MG008).
    #[error("[MG008] Migration run cancelled: {reason}")]
    Cancelled { reason: String },

    /// Migration settings rejected before the run started (MG009).
    #[error("[MG009] Invalid migration settings")]
    Config(#[source] CoreError),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
