use super::*;
use std::path::PathBuf;

#[test]
fn test_try_new_rejects_empty() {
    assert!(ScriptId::try_new("").is_none());
    assert_eq!(ScriptId::try_new("0001_init.sql").unwrap(), "0001_init.sql");
}

#[test]
#[should_panic(expected = "must not be empty")]
fn test_new_panics_on_empty() {
    let _ = ScriptId::new("");
}

#[test]
fn test_from_relative_path_flat() {
    let id = ScriptId::from_relative_path(Path::new("0001_init.sql")).unwrap();
    assert_eq!(id, "0001_init.sql");
}

#[test]
fn test_from_relative_path_nested_uses_forward_slashes() {
    let path: PathBuf = ["2024", "0003_orders.sql"].iter().collect();
    let id = ScriptId::from_relative_path(&path).unwrap();
    assert_eq!(id.as_str(), "2024/0003_orders.sql");
}

#[test]
fn test_from_relative_path_skips_cur_dir() {
    let id = ScriptId::from_relative_path(Path::new("./0001_init.sql")).unwrap();
    assert_eq!(id, "0001_init.sql");
}

#[test]
fn test_from_relative_path_rejects_escapes() {
    assert!(ScriptId::from_relative_path(Path::new("../outside.sql")).is_none());
    assert!(ScriptId::from_relative_path(Path::new("")).is_none());
}

#[test]
fn test_ordering_is_bytewise() {
    let mut ids = vec![
        ScriptId::new("0010_b.sql"),
        ScriptId::new("0002_a.sql"),
        ScriptId::new("0001_z.sql"),
        ScriptId::new("0001_Z.sql"),
    ];
    ids.sort();
    let names: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    assert_eq!(
        names,
        vec!["0001_Z.sql", "0001_z.sql", "0002_a.sql", "0010_b.sql"]
    );
}

#[test]
fn test_deserialize_rejects_empty() {
    let err = serde_yaml::from_str::<ScriptId>("\"\"").unwrap_err();
    assert!(err.to_string().contains("must not be empty"));
    let id: ScriptId = serde_yaml::from_str("0001_init.sql").unwrap();
    assert_eq!(id, "0001_init.sql");
}
