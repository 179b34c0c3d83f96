//! Migration source: discovers change-scripts on disk and orders them.

use crate::error::{MigrateError, MigrateResult};
use pl_core::sql_utils::has_transaction_control;
use pl_core::{compute_checksum, ScriptId};
use std::path::{Path, PathBuf};

/// One unit of schema change, read fresh from disk on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeScript {
    /// Root-relative identifier; its byte order is the execution order
    pub id: ScriptId,
    /// Location on disk
    pub path: PathBuf,
    /// Raw SQL, submitted to the database as one batch
    pub body: String,
}

impl ChangeScript {
    /// SHA-256 of the body, recorded in the ledger when the script is applied
    pub fn checksum(&self) -> String {
        compute_checksum(&self.body)
    }

    /// Whether the body opens or ends transactions itself
    pub fn manages_transaction(&self) -> bool {
        has_transaction_control(&self.body)
    }
}

/// Directory of change-scripts recognised by a file-name suffix.
#[derive(Debug, Clone)]
pub struct MigrationSource {
    root: PathBuf,
    suffix: String,
}

impl MigrationSource {
    /// Source reading files ending in `suffix` (e.g. `.sql`) under `root`
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
        }
    }

    /// Root directory scanned by [`discover`](Self::discover)
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collect every matching file below the root, sorted by identifier.
    ///
    /// A missing or unreadable root is an error; an existing root with no
    /// matching files yields an empty list.
    pub fn discover(&self) -> MigrateResult<Vec<ChangeScript>> {
        let metadata =
            std::fs::metadata(&self.root).map_err(|e| self.discovery_error(&self.root, e))?;
        if !metadata.is_dir() {
            let not_dir = std::io::Error::other("not a directory");
            return Err(self.discovery_error(&self.root, not_dir));
        }

        let mut scripts = Vec::new();
        self.discover_recursive(&self.root, &mut scripts)?;
        scripts.sort_by(|a, b| a.id.cmp(&b.id));

        log::debug!(
            "Discovered {} migration(s) in {}",
            scripts.len(),
            self.root.display()
        );
        Ok(scripts)
    }

    /// Recursively collect matching files in a directory
    ///
    /// Symlinked directories are not descended into; symlinked files are read
    /// through the link.
    fn discover_recursive(
        &self,
        dir: &Path,
        scripts: &mut Vec<ChangeScript>,
    ) -> MigrateResult<()> {
        let entries = std::fs::read_dir(dir).map_err(|e| self.discovery_error(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| self.discovery_error(dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| self.discovery_error(&path, e))?;

            if file_type.is_dir() {
                self.discover_recursive(&path, scripts)?;
            } else if self.matches(&path) {
                scripts.push(self.load_script(path)?);
            }
        }
        Ok(())
    }

    fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(self.suffix.as_str()))
    }

    fn load_script(&self, path: PathBuf) -> MigrateResult<ChangeScript> {
        let relative = path.strip_prefix(&self.root).unwrap_or(&path);
        let id = ScriptId::from_relative_path(relative).ok_or_else(|| {
            self.discovery_error(
                &path,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "file name is not valid UTF-8",
                ),
            )
        })?;
        let body = std::fs::read_to_string(&path).map_err(|e| self.discovery_error(&path, e))?;
        Ok(ChangeScript { id, path, body })
    }

    fn discovery_error(&self, path: &Path, source: std::io::Error) -> MigrateError {
        MigrateError::Discovery {
            path: path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
