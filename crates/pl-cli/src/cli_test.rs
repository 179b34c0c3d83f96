use super::*;
use clap::CommandFactory;

#[test]
fn test_verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_parse_migrate_with_flags() {
    let cli = Cli::try_parse_from([
        "plinth",
        "migrate",
        "--timeout",
        "30",
        "--no-transaction",
        "--strict-checksums",
        "--lock-ttl",
        "120",
        "--migrations-dir",
        "db/migrations",
    ])
    .unwrap();
    assert_eq!(
        cli.global.migrations_dir.as_deref(),
        Some(std::path::Path::new("db/migrations"))
    );
    match cli.command {
        Commands::Migrate(args) => {
            assert_eq!(args.timeout, Some(30));
            assert!(args.no_transaction);
            assert!(!args.no_lock);
            assert!(args.strict_checksums);
            assert_eq!(args.lock_ttl, Some(120));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_parse_status_json() {
    let cli = Cli::try_parse_from(["plinth", "status", "-o", "json"]).unwrap();
    match cli.command {
        Commands::Status(args) => assert_eq!(args.output, StatusOutput::Json),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_parse_new_requires_name() {
    assert!(Cli::try_parse_from(["plinth", "new"]).is_err());
    let cli = Cli::try_parse_from(["plinth", "new", "add_users"]).unwrap();
    match cli.command {
        Commands::New(args) => assert_eq!(args.name, "add_users"),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_global_args_after_subcommand() {
    let cli = Cli::try_parse_from(["plinth", "status", "-p", "/srv/app", "-d", ":memory:"]).unwrap();
    assert_eq!(cli.global.project_dir, std::path::PathBuf::from("/srv/app"));
    assert_eq!(cli.global.database.as_deref(), Some(":memory:"));
}
