//! pl-db - Database abstraction layer for Plinth
//!
//! This crate provides the `Database` trait consumed by the migration engine
//! and its DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use crate::duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{Database, Row};
