use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_parse_empty_config_uses_defaults() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config.database.path, "plinth.duckdb");
    assert_eq!(config.migrations.dir, "migrations");
    assert_eq!(config.migrations.suffix, ".sql");
    assert_eq!(config.migrations.ledger_table, "schema_migrations");
    assert_eq!(config.migrations.transaction, TransactionMode::PerScript);
    assert_eq!(config.migrations.checksum, ChecksumPolicy::Warn);
    assert!(config.migrations.lock);
    assert_eq!(config.migrations.lock_ttl(), Some(Duration::from_secs(3600)));
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
database:
  path: "./app.duckdb"
migrations:
  dir: db/changes
  suffix: ".up.sql"
  ledger_table: app_migrations
  transaction: none
  checksum: strict
  lock: false
  lock_ttl_secs: 120
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.database.path, "./app.duckdb");
    assert_eq!(config.migrations.dir, "db/changes");
    assert_eq!(config.migrations.suffix, ".up.sql");
    assert_eq!(config.migrations.ledger_table, "app_migrations");
    assert_eq!(config.migrations.transaction, TransactionMode::None);
    assert_eq!(config.migrations.checksum, ChecksumPolicy::Strict);
    assert!(!config.migrations.lock);
    assert_eq!(config.migrations.lock_ttl_secs, 120);
    config.validate().unwrap();
}

#[test]
fn test_zero_lock_ttl_never_expires() {
    let config: Config = serde_yaml::from_str("migrations:\n  lock_ttl_secs: 0\n").unwrap();
    assert_eq!(config.migrations.lock_ttl(), None);
}

#[test]
fn test_unknown_fields_rejected() {
    let yaml = r#"
migrations:
  directory: oops
"#;
    assert!(serde_yaml::from_str::<Config>(yaml).is_err());
}

#[test]
fn test_ledger_table_must_be_identifier() {
    let mut config = Config::default();
    config.migrations.ledger_table = "schema_migrations; DROP TABLE users".to_string();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));

    config.migrations.ledger_table = "1migrations".to_string();
    assert!(config.validate().is_err());

    config.migrations.ledger_table = "_ledger_v2".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_suffix_rejected() {
    let mut config = Config::default();
    config.migrations.suffix = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_load_from_dir_without_file_returns_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.migrations.dir, DEFAULT_MIGRATIONS_DIR);
}

#[test]
fn test_load_from_dir_prefers_yml() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("plinth.yml"), "migrations:\n  dir: a\n").unwrap();
    fs::write(dir.path().join("plinth.yaml"), "migrations:\n  dir: b\n").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.migrations.dir, "a");
}

#[test]
fn test_load_reports_parse_error_with_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plinth.yml");
    fs::write(&path, "migrations: [not, a, map]").unwrap();
    let err = Config::load(&path).unwrap_err();
    match err {
        CoreError::ConfigParseError { path: p, .. } => assert!(p.ends_with("plinth.yml")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let err = Config::load(&dir.path().join("nope.yml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_absolute_paths() {
    let config = Config::default();
    let root = PathBuf::from("/srv/app");
    assert_eq!(
        config.migrations_dir_absolute(&root),
        root.join("migrations")
    );
    assert_eq!(
        config.database_path_absolute(&root),
        root.join("plinth.duckdb").display().to_string()
    );

    let mut memory = Config::default();
    memory.database.path = ":memory:".to_string();
    assert_eq!(memory.database_path_absolute(&root), ":memory:");
}

#[test]
fn test_is_plain_identifier() {
    assert!(is_plain_identifier("schema_migrations"));
    assert!(is_plain_identifier("_x1"));
    assert!(!is_plain_identifier(""));
    assert!(!is_plain_identifier("a-b"));
    assert!(!is_plain_identifier("a.b"));
}
