//! Runs against a real SQL Server.
//!
//! Set `MSSQL_SCAFFOLD_TEST_CONNECTION` to an ADO connection string and
//! `MSSQL_SCAFFOLD_TEST_DATABASE` (default `master`), then run with
//! `--ignored`.

use mssql_scaffold::{MssqlConnectionFactory, Scaffolder};
use tempfile::TempDir;

fn connection() -> Option<(String, String)> {
    let cs = std::env::var("MSSQL_SCAFFOLD_TEST_CONNECTION").ok()?;
    let db = std::env::var("MSSQL_SCAFFOLD_TEST_DATABASE").unwrap_or_else(|_| "master".to_string());
    Some((cs, db))
}

#[test]
#[ignore = "requires MSSQL_SCAFFOLD_TEST_CONNECTION"]
fn test_live_generation() {
    let _ = env_logger::builder().is_test(true).try_init();
    let Some((cs, db)) = connection() else {
        eprintln!("MSSQL_SCAFFOLD_TEST_CONNECTION not set, skipping");
        return;
    };

    let scaffolder = Scaffolder::new(MssqlConnectionFactory::new(cs).unwrap());
    let tables = scaffolder.inspect(&db).unwrap();

    let tmp = TempDir::new().unwrap();
    let report = scaffolder.try_generate_schema(&db, tmp.path(), None, true).unwrap();
    assert_eq!(report.tables, tables.len());
    assert!(tmp.path().join("mod.rs").exists());
}

#[test]
#[ignore = "requires MSSQL_SCAFFOLD_TEST_CONNECTION"]
fn test_live_missing_database() {
    let Some((cs, _)) = connection() else {
        return;
    };

    let scaffolder = Scaffolder::new(MssqlConnectionFactory::new(cs).unwrap());
    let result = scaffolder.inspect("mssql_scaffold_does_not_exist");
    assert!(matches!(
        result,
        Err(mssql_scaffold::ExtractionError::DatabaseNotFound(_))
    ));
}
