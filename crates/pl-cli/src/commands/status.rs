//! Status command implementation

use anyhow::{Context, Result};
use pl_db::Database;
use pl_migrate::{ChangeScript, LedgerEntry, Migrator};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{load_project, print_table};

/// Where a migration stands relative to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ScriptState {
    /// Recorded and unchanged on disk
    Applied,
    /// Recorded, but the file's checksum differs from the recorded one
    Modified,
    /// On disk, not yet recorded
    Pending,
    /// Recorded, but no longer on disk
    Missing,
}

impl fmt::Display for ScriptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptState::Applied => write!(f, "applied"),
            ScriptState::Modified => write!(f, "modified"),
            ScriptState::Pending => write!(f, "pending"),
            ScriptState::Missing => write!(f, "missing"),
        }
    }
}

/// One line of status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct StatusRow {
    pub(crate) identifier: String,
    pub(crate) state: ScriptState,
    pub(crate) applied_at: Option<String>,
}

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator =
        Migrator::new(project.config.migrations.clone()).context("Invalid migration settings")?;
    let db = project.open_database()?;

    let scripts = migrator
        .source(&project.migrations_dir)
        .discover()
        .context("Failed to discover migrations")?;

    // Status is read-only: a database that was never migrated has no ledger.
    let ledger = migrator.ledger(&db);
    let entries = if db
        .relation_exists(ledger.table())
        .await
        .context("Failed to inspect database")?
    {
        ledger.entries().await.context("Failed to read ledger")?
    } else {
        Vec::new()
    };

    let rows = build_status(&scripts, &entries);

    match args.output {
        StatusOutput::Table => {
            let table_rows: Vec<Vec<String>> = rows
                .iter()
                .map(|r| {
                    vec![
                        r.identifier.clone(),
                        r.state.to_string(),
                        r.applied_at.clone().unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect();
            println!("Project: {}", project.root.display());
            println!();
            print_table(&["MIGRATION", "STATE", "APPLIED_AT"], &table_rows);
            println!();
            let pending = rows
                .iter()
                .filter(|r| r.state == ScriptState::Pending)
                .count();
            println!("{} migration(s), {} pending", rows.len(), pending);
        }
        StatusOutput::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}

/// Merge discovered scripts with ledger entries, ordered by identifier.
pub(crate) fn build_status(scripts: &[ChangeScript], entries: &[LedgerEntry]) -> Vec<StatusRow> {
    let recorded: HashMap<&str, &LedgerEntry> = entries
        .iter()
        .map(|e| (e.identifier.as_str(), e))
        .collect();

    let mut rows: Vec<StatusRow> = scripts
        .iter()
        .map(|script| match recorded.get(script.id.as_str()) {
            Some(entry) => {
                let modified = entry
                    .checksum
                    .as_deref()
                    .is_some_and(|sum| sum != script.checksum());
                StatusRow {
                    identifier: script.id.to_string(),
                    state: if modified {
                        ScriptState::Modified
                    } else {
                        ScriptState::Applied
                    },
                    applied_at: Some(entry.applied_at.clone()),
                }
            }
            None => StatusRow {
                identifier: script.id.to_string(),
                state: ScriptState::Pending,
                applied_at: None,
            },
        })
        .collect();

    let on_disk: std::collections::HashSet<&str> =
        scripts.iter().map(|s| s.id.as_str()).collect();
    rows.extend(
        entries
            .iter()
            .filter(|e| !on_disk.contains(e.identifier.as_str()))
            .map(|e| StatusRow {
                identifier: e.identifier.to_string(),
                state: ScriptState::Missing,
                applied_at: Some(e.applied_at.clone()),
            }),
    );

    rows.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    rows
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
