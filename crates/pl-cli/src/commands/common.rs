//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use pl_core::Config;
use pl_db::DuckDbBackend;
use std::path::PathBuf;

use crate::cli::GlobalArgs;

/// Project configuration with command-line overrides applied.
#[derive(Debug, Clone)]
pub(crate) struct Project {
    /// Project root directory
    pub(crate) root: PathBuf,
    /// Parsed plinth.yml (or defaults)
    pub(crate) config: Config,
    /// Directory scanned for change-scripts
    pub(crate) migrations_dir: PathBuf,
    /// DuckDB path or `:memory:`
    pub(crate) database_path: String,
}

impl Project {
    /// Open the target database.
    pub(crate) fn open_database(&self) -> Result<DuckDbBackend> {
        DuckDbBackend::new(&self.database_path)
            .with_context(|| format!("Failed to open database: {}", self.database_path))
    }
}

/// Load the project configuration and apply `--database` / `--migrations-dir`.
///
/// Flag and environment overrides are taken as given (relative to the
/// working directory); paths from plinth.yml are relative to the project root.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = global.project_dir.clone();
    let config = match &global.config {
        Some(path) => Config::load(path),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load configuration")?;

    let migrations_dir = global
        .migrations_dir
        .clone()
        .unwrap_or_else(|| config.migrations_dir_absolute(&root));
    let database_path = global
        .database
        .clone()
        .unwrap_or_else(|| config.database_path_absolute(&root));

    log::debug!(
        "Project root {}, migrations {}, database {}",
        root.display(),
        migrations_dir.display(),
        database_path
    );

    Ok(Project {
        root,
        config,
        migrations_dir,
        database_path,
    })
}

/// Calculate column widths for a table from headers and rows.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Print a formatted table to stdout.
///
/// Columns are left-aligned and separated by two spaces, with a dashed
/// separator under the header.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    let header_parts: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_parts.join("  ").trim_end());

    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));

    for row in rows {
        let row_parts: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", row_parts.join("  ").trim_end());
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
