//! Forward-only SQL schema migrations for Plinth.
//!
//! A run discovers change-scripts under a directory, orders them by
//! identifier, and applies each one whose identifier is missing from the
//! ledger table. The ledger's uniqueness constraint, not process state, is
//! the source of truth for what has been applied.

pub mod context;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod source;

#[cfg(test)]
pub(crate) mod test_utils;

pub use context::RunContext;
pub use error::{MigrateError, MigrateResult};
pub use executor::{run, Migrator, RunEvent, RunReport};
pub use ledger::{Ledger, LedgerEntry, LockInfo};
pub use source::{ChangeScript, MigrationSource};
