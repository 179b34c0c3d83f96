use super::*;
use crate::test_utils::write_script as write;
use std::fs;
use tempfile::tempdir;

fn ids(scripts: &[ChangeScript]) -> Vec<&str> {
    scripts.iter().map(|s| s.id.as_str()).collect()
}

#[test]
fn test_discover_sorts_lexicographically() {
    let dir = tempdir().unwrap();
    write(dir.path(), "0010_orders.sql", "SELECT 10;");
    write(dir.path(), "0002_index.sql", "SELECT 2;");
    write(dir.path(), "0001_init.sql", "SELECT 1;");

    let scripts = MigrationSource::new(dir.path(), ".sql").discover().unwrap();
    assert_eq!(
        ids(&scripts),
        vec!["0001_init.sql", "0002_index.sql", "0010_orders.sql"]
    );
    assert_eq!(scripts[0].body, "SELECT 1;");
}

#[test]
fn test_discover_ignores_other_suffixes() {
    let dir = tempdir().unwrap();
    write(dir.path(), "0001_init.sql", "SELECT 1;");
    write(dir.path(), "README.md", "# notes");
    write(dir.path(), "0002_draft.sql.bak", "SELECT 2;");

    let scripts = MigrationSource::new(dir.path(), ".sql").discover().unwrap();
    assert_eq!(ids(&scripts), vec!["0001_init.sql"]);
}

#[test]
fn test_discover_custom_suffix() {
    let dir = tempdir().unwrap();
    write(dir.path(), "0001_init.up.sql", "SELECT 1;");
    write(dir.path(), "0001_init.down.sql", "SELECT 0;");

    let scripts = MigrationSource::new(dir.path(), ".up.sql")
        .discover()
        .unwrap();
    assert_eq!(ids(&scripts), vec!["0001_init.up.sql"]);
}

#[test]
fn test_discover_recurses_into_subdirectories() {
    let dir = tempdir().unwrap();
    write(dir.path(), "2024/0002_b.sql", "SELECT 2;");
    write(dir.path(), "2023/0009_a.sql", "SELECT 9;");
    write(dir.path(), "0001_root.sql", "SELECT 1;");

    let scripts = MigrationSource::new(dir.path(), ".sql").discover().unwrap();
    assert_eq!(
        ids(&scripts),
        vec!["0001_root.sql", "2023/0009_a.sql", "2024/0002_b.sql"]
    );
    assert!(scripts[1].path.ends_with("0009_a.sql"));
}

#[test]
fn test_discover_empty_directory() {
    let dir = tempdir().unwrap();
    let scripts = MigrationSource::new(dir.path(), ".sql").discover().unwrap();
    assert!(scripts.is_empty());
}

#[test]
fn test_discover_missing_root_is_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("migrations");
    let err = MigrationSource::new(&missing, ".sql").discover().unwrap_err();
    match err {
        MigrateError::Discovery { path, .. } => assert!(path.ends_with("migrations")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_discover_file_root_is_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("0001_init.sql");
    fs::write(&file, "SELECT 1;").unwrap();
    let err = MigrationSource::new(&file, ".sql").discover().unwrap_err();
    assert!(matches!(err, MigrateError::Discovery { .. }));
}

#[test]
fn test_checksum_tracks_body() {
    let dir = tempdir().unwrap();
    write(dir.path(), "0001_init.sql", "CREATE TABLE a (id INT);");
    let first = MigrationSource::new(dir.path(), ".sql").discover().unwrap();

    write(dir.path(), "0001_init.sql", "CREATE TABLE a (id BIGINT);");
    let second = MigrationSource::new(dir.path(), ".sql").discover().unwrap();

    assert_eq!(first[0].id, second[0].id);
    assert_ne!(first[0].checksum(), second[0].checksum());
}

#[cfg(unix)]
#[test]
fn test_discover_does_not_follow_directory_symlinks() {
    let dir = tempdir().unwrap();
    write(dir.path(), "shared/0001_a.sql", "SELECT 1;");
    std::os::unix::fs::symlink(dir.path().join("shared"), dir.path().join("linked")).unwrap();
    std::os::unix::fs::symlink(dir.path(), dir.path().join("shared/loop")).unwrap();

    let scripts = MigrationSource::new(dir.path(), ".sql").discover().unwrap();
    assert_eq!(ids(&scripts), vec!["shared/0001_a.sql"]);
}

#[cfg(unix)]
#[test]
fn test_discover_reads_symlinked_files() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    write(outside.path(), "body.sql", "SELECT 1;");
    std::os::unix::fs::symlink(outside.path().join("body.sql"), dir.path().join("0001_a.sql"))
        .unwrap();

    let scripts = MigrationSource::new(dir.path(), ".sql").discover().unwrap();
    assert_eq!(ids(&scripts), vec!["0001_a.sql"]);
    assert_eq!(scripts[0].body, "SELECT 1;");
}

#[test]
fn test_manages_transaction() {
    let dir = tempdir().unwrap();
    write(dir.path(), "0001_plain.sql", "CREATE TABLE a (id INT);");
    write(dir.path(), "0002_own_tx.sql", "BEGIN;\nCREATE TABLE b (id INT);\nCOMMIT;");

    let scripts = MigrationSource::new(dir.path(), ".sql").discover().unwrap();
    assert!(!scripts[0].manages_transaction());
    assert!(scripts[1].manages_transaction());
}
