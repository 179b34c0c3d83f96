//! New command implementation

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::fs;

use crate::cli::{GlobalArgs, NewArgs};
use crate::commands::common::load_project;

/// Execute the new command
pub async fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let file_name = script_file_name(&args.name, &project.config.migrations.suffix, Utc::now())?;

    fs::create_dir_all(&project.migrations_dir).with_context(|| {
        format!(
            "Failed to create migrations directory: {}",
            project.migrations_dir.display()
        )
    })?;

    let path = project.migrations_dir.join(&file_name);
    if path.exists() {
        bail!("Migration already exists: {}", path.display());
    }
    fs::write(&path, format!("-- {}\n", args.name))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created {}", path.display());
    Ok(())
}

/// `<UTC yyyymmddHHMMSS>_<name><suffix>`, so lexicographic order matches
/// creation order.
pub(crate) fn script_file_name(name: &str, suffix: &str, now: DateTime<Utc>) -> Result<String> {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if slug.is_empty() {
        bail!("Migration name cannot be empty");
    }
    if let Some(bad) = slug
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        bail!("Migration name '{name}' contains unsupported character '{bad}'");
    }
    Ok(format!("{}_{}{}", now.format("%Y%m%d%H%M%S"), slug, suffix))
}

#[cfg(test)]
#[path = "new_test.rs"]
mod tests;
