use ssql::config::SamplingSettings;
use ssql::convert::convert;
use ssql::db::{Database, SqliteDatabase, Value};
use ssql::engine::{Engine, Outcome, TransactionPolicy};
use ssql::error::SsqlError;
use ssql::sampling::{composite_hash, hash_component, level_bound, level_for_hash};
use ssql::sql::Dialect;

const ESTIMATE: &str =
    "SELECT SAMPLE(id -> t AS s) UNTIL((SELECT COUNT(*) FROM s) >= 3) SELECT COUNT(*) FROM s";

/// Eight rows already bucketed: four at level -1, two at -2, one at -3 and
/// one at -5.
fn sampled_db() -> SqliteDatabase {
    let mut db = SqliteDatabase::open_in_memory().unwrap();
    db.execute("CREATE TABLE t (_id_level INTEGER, id INTEGER)").unwrap();
    let levels = [-1, -1, -1, -1, -2, -2, -3, -5];
    for (id, level) in levels.iter().enumerate() {
        db.execute(&format!("INSERT INTO t VALUES ({level}, {id})")).unwrap();
    }

    let plan = convert("CREATE TABLE t (id INTEGER, SAMPLEKEY(id))", Dialect::Sqlite).unwrap();
    db.execute(&plan.catalog_create).unwrap();
    db.execute(&plan.catalog_insert).unwrap();
    db
}

fn engine(inline_view: bool, num_levels: u32) -> Engine {
    Engine::with_settings(
        Dialect::Sqlite,
        SamplingSettings {
            inline_view: Some(inline_view),
            num_levels,
            ..SamplingSettings::default()
        },
    )
}

fn single_value(outcome: Outcome) -> Value {
    match outcome {
        Outcome::Rows(rows) => {
            assert_eq!(rows.len(), 1);
            rows.rows[0][0].clone()
        }
        other => panic!("expected rows, got {other:?}"),
    }
}

#[test]
fn test_search_stops_at_first_sufficient_level() {
    for inline_view in [false, true] {
        let mut db = sampled_db();
        let outcome = engine(inline_view, 32).execute(&mut db, ESTIMATE).unwrap();
        // level 1 keeps rows at -2 and below
        assert_eq!(single_value(outcome), Value::Int(4), "inline_view={inline_view}");
    }
}

#[test]
fn test_factor_scales_the_estimate() {
    let mut db = sampled_db();
    let outcome = engine(false, 32)
        .execute(
            &mut db,
            "SELECT SAMPLE(id -> t AS s) UNTIL((SELECT COUNT(*) FROM s) >= 3) \
             SELECT COUNT(*) * _FACTOR FROM s",
        )
        .unwrap();
    assert_eq!(single_value(outcome), Value::Float(8.0));
}

#[test]
fn test_exhausted_search() {
    let mut db = sampled_db();
    let err = engine(false, 8)
        .execute(
            &mut db,
            "SELECT SAMPLE(id -> t AS s) UNTIL((SELECT COUNT(*) FROM s) >= 100) SELECT COUNT(*) FROM s",
        )
        .unwrap_err();
    assert!(matches!(err, SsqlError::RefinementExhausted { levels: 8 }));
}

#[test]
fn test_statements_without_sampling_pass_through() {
    let mut db = sampled_db();
    let mut engine = engine(false, 32);

    let outcome = engine.execute(&mut db, "INSERT INTO t VALUES (-1, 100)").unwrap();
    assert_eq!(outcome, Outcome::Executed { affected: 1 });

    let outcome = engine.execute(&mut db, "SELECT COUNT(*) FROM t").unwrap();
    assert_eq!(single_value(outcome), Value::Int(9));
    assert!(!engine.catalog().is_loaded());
}

#[test]
fn test_explain_does_not_run_queries() {
    let mut db = sampled_db();
    let statements = engine(false, 32).explain(&mut db, ESTIMATE).unwrap().unwrap();
    assert_eq!(
        statements,
        vec![
            "WITH s AS (SELECT * FROM t WHERE t._id_level <= -5) SELECT (SELECT COUNT(*) FROM s) >= 3",
            "WITH s AS (SELECT * FROM t WHERE t._id_level <= -5) SELECT COUNT(*) FROM s",
        ]
    );
}

#[test]
fn test_missing_catalog_is_a_database_error() {
    let mut db = SqliteDatabase::open_in_memory().unwrap();
    let err = engine(false, 32).execute(&mut db, ESTIMATE).unwrap_err();
    assert!(err.is_database());
}

#[test]
fn test_catalog_creation_tolerates_existing_table() {
    let plan = convert("CREATE TABLE t (id INTEGER, SAMPLEKEY(id))", Dialect::Sqlite).unwrap();
    let mut db = SqliteDatabase::open_in_memory().unwrap();

    assert!(TransactionPolicy::Direct.create_catalog(&mut db, &plan.catalog_create).unwrap());
    assert!(!TransactionPolicy::Direct.create_catalog(&mut db, &plan.catalog_create).unwrap());

    db.begin().unwrap();
    assert!(!TransactionPolicy::Savepoint
        .create_catalog(&mut db, &plan.catalog_create)
        .unwrap());
    // the transaction survived the failed statement
    db.execute(&plan.catalog_insert).unwrap();
    db.commit().unwrap();
    assert_eq!(db.query("SELECT * FROM _SAMPLE_KEY_DEFS").unwrap().len(), 1);
}

// =============================================================================
// Conversion on SQLite
// =============================================================================

/// `raw(id, v)` with 1000 rows, some ids negative.
fn raw_db() -> SqliteDatabase {
    let mut db = SqliteDatabase::open_in_memory().unwrap();
    db.execute("CREATE TABLE raw (id INTEGER, v INTEGER)").unwrap();
    let values: Vec<String> = (0..1000i64)
        .map(|x| format!("({}, {})", x * 7919 - 400_000, x % 13))
        .collect();
    db.execute(&format!("INSERT INTO raw VALUES {}", values.join(", ")))
        .unwrap();
    db
}

fn int(value: &Value) -> i64 {
    match value {
        Value::Int(i) => *i,
        other => panic!("expected integer, got {other:?}"),
    }
}

/// `(id, v, level columns...)` for every converted row.
fn converted(db: &mut SqliteDatabase, levels: &str) -> Vec<Vec<i64>> {
    let rows = db.query(&format!("SELECT id, v, {levels} FROM t")).unwrap();
    assert_eq!(rows.len(), 1000);
    rows.rows.iter().map(|row| row.iter().map(int).collect()).collect()
}

fn convert_raw(sql: &str) -> SqliteDatabase {
    let mut db = raw_db();
    let outcome = Engine::new(Dialect::Sqlite).execute(&mut db, sql).unwrap();
    assert!(matches!(outcome, Outcome::Converted { .. }));
    db
}

#[test]
fn test_conversion_levels_match_hash_scheme() {
    let mut db = convert_raw("CREATE TABLE t (id INTEGER, v INTEGER, SAMPLEKEY(id)) FROM raw");
    for row in converted(&mut db, "_id_level") {
        let expected = level_for_hash(hash_component(0, row[0]).unwrap());
        assert_eq!(row[2], i64::from(expected), "id {}", row[0]);
    }
}

#[test]
fn test_conversion_with_two_keys() {
    let mut db = convert_raw("CREATE TABLE t (id INTEGER, v INTEGER, SAMPLEKEY(id, v)) FROM raw");
    for row in converted(&mut db, "_id_level, _v_level, _LEVEL_SUM") {
        let id_level = i64::from(level_for_hash(hash_component(0, row[0]).unwrap()));
        let v_level = i64::from(level_for_hash(hash_component(1, row[1]).unwrap()));
        assert_eq!(row[2..], [id_level, v_level, id_level + v_level], "row {row:?}");
    }
}

#[test]
fn test_conversion_with_composite_key() {
    let mut db = convert_raw(
        "CREATE TABLE t (id INTEGER, v INTEGER, SAMPLEKEY(id, (id, v) AS k)) FROM raw",
    );
    for row in converted(&mut db, "_k_level") {
        let expected = level_for_hash(composite_hash(1, &[row[0], row[1]]).unwrap());
        assert_eq!(row[2], i64::from(expected), "row {row:?}");
    }
}

#[test]
fn test_sampling_a_converted_table() {
    let mut db = convert_raw("CREATE TABLE t (id INTEGER, v INTEGER, SAMPLEKEY(id)) FROM raw");

    let levels: Vec<i32> = converted(&mut db, "_id_level")
        .iter()
        .map(|row| row[2] as i32)
        .collect();
    let (target, kept) = (0..32u32)
        .rev()
        .map(|t| (t, levels.iter().filter(|&&l| l <= level_bound(t)).count()))
        .find(|&(_, kept)| kept >= 50)
        .unwrap();

    // unaliased sample over the default inline views
    let mut engine = Engine::new(Dialect::Sqlite);
    let sql = "SELECT SAMPLE(id -> t) UNTIL((SELECT COUNT(*) FROM t) >= 50) \
               SELECT COUNT(*) * _FACTOR FROM t";
    let outcome = engine.execute(&mut db, sql).unwrap();
    assert_eq!(
        single_value(outcome),
        Value::Float(kept as f64 * 2f64.powi(target as i32))
    );

    let statements = engine.explain(&mut db, sql).unwrap().unwrap();
    assert_eq!(
        statements[1],
        "SELECT COUNT(*) * 16.0 FROM (SELECT * FROM t WHERE t._id_level <= -5) AS t"
    );
}
