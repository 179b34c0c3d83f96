//! Configuration types and parsing for plinth.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default directory holding change-scripts, relative to the project root
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Default file-name suffix that marks a change-script
pub const DEFAULT_SCRIPT_SUFFIX: &str = ".sql";

/// Default name of the ledger table
pub const DEFAULT_LEDGER_TABLE: &str = "schema_migrations";

/// Default DuckDB database file, relative to the project root
pub const DEFAULT_DB_PATH: &str = "plinth.duckdb";

/// Default age after which an abandoned run lock may be reclaimed
pub const DEFAULT_LOCK_TTL_SECS: u64 = 3600;

/// File names probed by [`Config::load_from_dir`], in order
pub const CONFIG_FILE_NAMES: &[&str] = &["plinth.yml", "plinth.yaml"];

/// Main project configuration from plinth.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Migration engine configuration
    #[serde(default)]
    pub migrations: MigrationsConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Settings that drive a migration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationsConfig {
    /// Directory containing change-scripts
    #[serde(default = "default_migrations_dir")]
    pub dir: String,

    /// File-name suffix recognised as a change-script; other files are ignored
    #[serde(default = "default_script_suffix")]
    pub suffix: String,

    /// Name of the ledger table recording applied scripts
    #[serde(default = "default_ledger_table")]
    pub ledger_table: String,

    /// Whether a script and its ledger row share one transaction
    #[serde(default)]
    pub transaction: TransactionMode,

    /// What to do when an applied script's body no longer matches its checksum
    #[serde(default)]
    pub checksum: ChecksumPolicy,

    /// Hold the ledger lock row for the duration of a run
    #[serde(default = "default_true")]
    pub lock: bool,

    /// Seconds after which a lock left by a crashed run may be taken over;
    /// `0` means the lock never expires
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: default_migrations_dir(),
            suffix: default_script_suffix(),
            ledger_table: default_ledger_table(),
            transaction: TransactionMode::default(),
            checksum: ChecksumPolicy::default(),
            lock: true,
            lock_ttl_secs: DEFAULT_LOCK_TTL_SECS,
        }
    }
}

/// Transaction boundary around a single change-script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// Script body and ledger insert commit or roll back together
    #[default]
    PerScript,
    /// Script body and ledger insert are separate statements; bodies must be
    /// safe to re-run after a crash between the two
    None,
}

impl std::fmt::Display for TransactionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionMode::PerScript => write!(f, "per_script"),
            TransactionMode::None => write!(f, "none"),
        }
    }
}

/// Policy for applied scripts whose body changed since they were recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    /// Never compare checksums
    Ignore,
    /// Log a warning and keep going
    #[default]
    Warn,
    /// Abort the run
    Strict,
}

impl std::fmt::Display for ChecksumPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecksumPolicy::Ignore => write!(f, "ignore"),
            ChecksumPolicy::Warn => write!(f, "warn"),
            ChecksumPolicy::Strict => write!(f, "strict"),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_lock_ttl_secs() -> u64 {
    DEFAULT_LOCK_TTL_SECS
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_migrations_dir() -> String {
    DEFAULT_MIGRATIONS_DIR.to_string()
}

fn default_script_suffix() -> String {
    DEFAULT_SCRIPT_SUFFIX.to_string()
}

fn default_ledger_table() -> String {
    DEFAULT_LEDGER_TABLE.to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                path: path.display().to_string(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    ///
    /// Looks for plinth.yml or plinth.yaml. A directory without either file
    /// yields the default configuration.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        log::debug!(
            "No plinth.yml in {}, using default configuration",
            dir.display()
        );
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.database.path.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }
        self.migrations.validate()
    }

    /// Absolute database path, unless the database is in-memory
    pub fn database_path_absolute(&self, root: &Path) -> String {
        if self.database.path == ":memory:" {
            return self.database.path.clone();
        }
        root.join(&self.database.path).display().to_string()
    }

    /// Absolute migrations directory
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations.dir)
    }
}

impl MigrationsConfig {
    /// Validate the migration settings
    ///
    /// The ledger table name is interpolated into DDL, so it is restricted
    /// to a plain SQL identifier.
    pub fn validate(&self) -> CoreResult<()> {
        if self.dir.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations.dir cannot be empty".to_string(),
            });
        }
        if self.suffix.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations.suffix cannot be empty".to_string(),
            });
        }
        if !is_plain_identifier(&self.ledger_table) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "migrations.ledger_table '{}' must match [A-Za-z_][A-Za-z0-9_]*",
                    self.ledger_table
                ),
            });
        }
        Ok(())
    }

    /// Lease length for the run lock, `None` when it never expires
    pub fn lock_ttl(&self) -> Option<Duration> {
        (self.lock_ttl_secs > 0).then(|| Duration::from_secs(self.lock_ttl_secs))
    }
}

/// Whether `name` is a bare SQL identifier safe to interpolate unquoted.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
