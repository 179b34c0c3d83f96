//! pl-core - Core library for Plinth
//!
//! This crate provides the types shared by the migration engine and the CLI:
//! strongly-typed script identifiers, content checksums, `plinth.yml`
//! configuration parsing, and light SQL text inspection.

pub mod checksum;
pub mod config;
pub mod error;
pub mod script_id;
pub mod sql_utils;

pub use checksum::compute_checksum;
pub use config::{ChecksumPolicy, Config, DatabaseConfig, MigrationsConfig, TransactionMode};
pub use error::{CoreError, CoreResult};
pub use script_id::ScriptId;
