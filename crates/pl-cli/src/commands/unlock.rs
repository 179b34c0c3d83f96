//! Unlock command implementation

use anyhow::{Context, Result};
use pl_db::Database;
use pl_migrate::Migrator;

use crate::cli::{GlobalArgs, UnlockArgs};
use crate::commands::common::load_project;

/// Execute the unlock command
pub async fn execute(_args: &UnlockArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator =
        Migrator::new(project.config.migrations.clone()).context("Invalid migration settings")?;
    let db = project.open_database()?;
    let ledger = migrator.ledger(&db);

    if !db
        .relation_exists(&ledger.lock_table())
        .await
        .context("Failed to inspect database")?
    {
        println!("No migration lock held");
        return Ok(());
    }

    match ledger
        .force_release_lock()
        .await
        .context("Failed to release migration lock")?
    {
        Some(previous) => {
            log::warn!("Force-released migration lock held by {}", previous.holder);
            println!(
                "Released migration lock held by {} since {}",
                previous.holder, previous.acquired_at
            );
        }
        None => println!("No migration lock held"),
    }
    Ok(())
}
