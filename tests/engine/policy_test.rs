#[path = "../common/mod.rs"]
mod common;

use common::{catalog_rows, duplicate_table, ScriptedDb};
use ssql::db::DbError;
use ssql::engine::{Engine, Outcome, TransactionPolicy, CATALOG_SAVEPOINT};
use ssql::sql::Dialect;

const CREATE_CATALOG: &str = "CREATE TABLE _SAMPLE_KEY_DEFS (x INT)";

#[test]
fn test_savepoint_rolls_back_duplicate() {
    let mut db = ScriptedDb::new()
        .in_transaction()
        .fail_when("CREATE TABLE _SAMPLE_KEY_DEFS", duplicate_table());

    let created = TransactionPolicy::Savepoint
        .create_catalog(&mut db, CREATE_CATALOG)
        .unwrap();

    assert!(!created);
    assert_eq!(
        db.calls,
        vec![
            format!("SAVEPOINT {CATALOG_SAVEPOINT}"),
            CREATE_CATALOG.to_string(),
            format!("ROLLBACK TO SAVEPOINT {CATALOG_SAVEPOINT}"),
            format!("RELEASE SAVEPOINT {CATALOG_SAVEPOINT}"),
        ]
    );
}

#[test]
fn test_savepoint_released_after_success() {
    let mut db = ScriptedDb::new().in_transaction();
    assert!(TransactionPolicy::Savepoint
        .create_catalog(&mut db, CREATE_CATALOG)
        .unwrap());
    assert_eq!(
        db.calls,
        vec![
            format!("SAVEPOINT {CATALOG_SAVEPOINT}"),
            CREATE_CATALOG.to_string(),
            format!("RELEASE SAVEPOINT {CATALOG_SAVEPOINT}"),
        ]
    );
}

#[test]
fn test_savepoint_reraises_other_failures_and_still_releases() {
    let mut db = ScriptedDb::new()
        .in_transaction()
        .fail_when("CREATE TABLE", DbError::with_sqlstate("53100", "disk full"));

    let err = TransactionPolicy::Savepoint
        .create_catalog(&mut db, CREATE_CATALOG)
        .unwrap_err();

    assert_eq!(err.to_string(), "disk full");
    assert_eq!(
        db.calls.last().map(String::as_str),
        Some("RELEASE SAVEPOINT ssql_catalog")
    );
}

#[test]
fn test_savepoint_release_failure_ignored() {
    let mut db = ScriptedDb::new()
        .in_transaction()
        .fail_when("RELEASE", DbError::new("no such savepoint"));
    assert!(TransactionPolicy::Savepoint
        .create_catalog(&mut db, CREATE_CATALOG)
        .unwrap());
}

#[test]
fn test_commit_first_commits_around_duplicate() {
    let mut db = ScriptedDb::new()
        .in_transaction()
        .fail_when("_SAMPLE_KEY_DEFS", duplicate_table());

    let created = TransactionPolicy::CommitFirst
        .create_catalog(&mut db, CREATE_CATALOG)
        .unwrap();

    assert!(!created);
    assert_eq!(db.calls, vec!["COMMIT", CREATE_CATALOG, "COMMIT"]);
}

#[test]
fn test_commit_first_reraises_other_failures() {
    let mut db = ScriptedDb::new()
        .in_transaction()
        .fail_when("_SAMPLE_KEY_DEFS", DbError::with_sqlstate("08006", "connection lost"));
    assert!(TransactionPolicy::CommitFirst
        .create_catalog(&mut db, CREATE_CATALOG)
        .is_err());
    assert_eq!(db.calls, vec!["COMMIT", CREATE_CATALOG]);
}

#[test]
fn test_autocommit_runs_directly_whatever_the_policy() {
    for policy in [
        TransactionPolicy::Savepoint,
        TransactionPolicy::CommitFirst,
        TransactionPolicy::Direct,
    ] {
        let mut db = ScriptedDb::new().fail_when("_SAMPLE_KEY_DEFS", duplicate_table());
        assert!(!policy.create_catalog(&mut db, CREATE_CATALOG).unwrap());
        assert_eq!(db.calls, vec![CREATE_CATALOG], "{policy:?}");
    }
}

#[test]
fn test_direct_ignores_duplicate_inside_transaction() {
    let mut db = ScriptedDb::new()
        .in_transaction()
        .fail_when("_SAMPLE_KEY_DEFS", duplicate_table());
    assert!(!TransactionPolicy::Direct
        .create_catalog(&mut db, CREATE_CATALOG)
        .unwrap());
    assert_eq!(db.calls, vec![CREATE_CATALOG]);
}

#[test]
fn test_engine_conversion_sequence_postgres() {
    let mut db = ScriptedDb::new()
        .in_transaction()
        .fail_when("CREATE TABLE _SAMPLE_KEY_DEFS", duplicate_table());
    let mut engine = Engine::new(Dialect::Postgres);

    let outcome = engine
        .execute(&mut db, "CREATE TABLE t (id INT, v INT, SAMPLEKEY(id))")
        .unwrap();

    let Outcome::Converted { statements } = outcome else {
        panic!("expected a conversion");
    };
    assert_eq!(statements.len(), 6);

    let heads: Vec<&str> = db
        .calls
        .iter()
        .map(|c| c.lines().next().unwrap_or(""))
        .collect();
    assert_eq!(
        heads,
        vec![
            "CREATE TABLE t (_id_level SMALLINT, id INT, v INT)",
            "SAVEPOINT ssql_catalog",
            "CREATE TABLE _SAMPLE_KEY_DEFS (",
            "ROLLBACK TO SAVEPOINT ssql_catalog",
            "RELEASE SAVEPOINT ssql_catalog",
            "INSERT INTO _SAMPLE_KEY_DEFS VALUES",
            "INSERT INTO t",
            "CREATE INDEX cidx_t ON t(_id_level)",
            "CLUSTER t USING cidx_t",
        ]
    );
}

#[test]
fn test_engine_reloads_catalog_after_conversion() {
    let mut db = ScriptedDb::new()
        .answer("_SAMPLE_KEY_DEFS ORDER BY", [catalog_rows(&[("s", "id", "_id_level")])])
        .answer(
            "_SAMPLE_KEY_DEFS ORDER BY",
            [catalog_rows(&[("s", "id", "_id_level"), ("t", "k", "_k_level")])],
        );
    let mut engine = Engine::new(Dialect::Generic);

    let pair = engine
        .rewrite_at(&mut db, "SELECT SAMPLE(id -> s) UNTIL(1 = 1) SELECT 1 FROM s", 2)
        .unwrap();
    assert!(pair.is_some());
    assert!(engine.catalog().resolve("t").is_none());

    engine
        .execute(&mut db, "CREATE TABLE t (k INT, SAMPLEKEY(k))")
        .unwrap();
    assert!(engine.catalog().is_unit_key("t", "k"));
}
