//! Migrate command implementation

use anyhow::{Context, Result};
use pl_core::{ChecksumPolicy, MigrationsConfig, TransactionMode};
use pl_migrate::{Migrator, RunContext, RunReport};
use std::time::Duration;

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::load_project;

/// Execute the migrate command
pub async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let settings = apply_overrides(project.config.migrations.clone(), args);
    let migrator = Migrator::new(settings).context("Invalid migration settings")?;
    let db = project.open_database()?;

    let ctx = match args.timeout {
        Some(secs) => RunContext::with_timeout(Duration::from_secs(secs)),
        None => RunContext::new(),
    };

    println!(
        "Migrating {} from {}",
        project.database_path,
        project.migrations_dir.display()
    );

    let report = migrator
        .run(&ctx, &db, &project.migrations_dir)
        .await
        .context("Migration run failed")?;

    print_summary(&report);
    Ok(())
}

/// Fold command-line switches into the configured settings.
fn apply_overrides(mut settings: MigrationsConfig, args: &MigrateArgs) -> MigrationsConfig {
    if args.no_transaction {
        settings.transaction = TransactionMode::None;
    }
    if args.no_lock {
        settings.lock = false;
    }
    if args.strict_checksums {
        settings.checksum = ChecksumPolicy::Strict;
    }
    if let Some(ttl) = args.lock_ttl {
        settings.lock_ttl_secs = ttl;
    }
    settings
}

fn print_summary(report: &RunReport) {
    for id in &report.applied {
        println!("  Applied: {id}");
    }
    println!();
    if report.is_noop() {
        println!(
            "Database is up to date ({} migration{} already applied)",
            report.skipped.len(),
            if report.skipped.len() == 1 { "" } else { "s" }
        );
    } else {
        println!(
            "Applied {} migration{}, {} already applied, in {}ms",
            report.applied.len(),
            if report.applied.len() == 1 { "" } else { "s" },
            report.skipped.len(),
            report.elapsed.as_millis()
        );
    }
}

#[cfg(test)]
#[path = "migrate_test.rs"]
mod tests;
