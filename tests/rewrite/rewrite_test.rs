#[path = "../common/mod.rs"]
mod common;

use common::catalog_with;
use ssql::catalog::{Catalog, SamplingTableDefinition};
use ssql::error::{SemanticError, SsqlError};
use ssql::rewrite::{EmissionMode, QueryPair, SamplingCompiler};
use ssql::sql::Dialect;

fn cte(sql: &str) -> SamplingCompiler {
    SamplingCompiler::new(sql, Dialect::Generic, 32, false).unwrap()
}

fn rewrite(sql: &str, level: u32, catalog: &Catalog) -> QueryPair {
    cte(sql).rewrite(level, catalog).unwrap().unwrap()
}

#[test]
fn test_cte_scenario_with_alias_and_factor() {
    let pair = rewrite(
        "SELECT SAMPLE(id -> sales AS s) UNTIL((SELECT COUNT(*) FROM s) >= 1000)\n\
         SELECT region, SUM(amount) * _FACTOR FROM s GROUP BY region;",
        4,
        &catalog_with("sales", &["id"]),
    );

    assert_eq!(pair.level, 4);
    assert_eq!(
        pair.condition_query.as_deref(),
        Some(
            "WITH s AS (SELECT * FROM sales WHERE sales._id_level <= -5) \
             SELECT (SELECT COUNT(*) FROM s) >= 1000"
        )
    );
    assert_eq!(
        pair.aggregate_query,
        "WITH s AS (SELECT * FROM sales WHERE sales._id_level <= -5) \
         SELECT region, SUM(amount) * 16.0 FROM s GROUP BY region"
    );
}

#[test]
fn test_top_level_with_is_merged_after_samples() {
    let pair = rewrite(
        "WITH r AS (SELECT * FROM regions) SELECT SAMPLE(id -> sales) UNTIL(COUNT(*) > 0) \
         SELECT r.name, COUNT(*) FROM sales JOIN r ON sales.region = r.id GROUP BY r.name",
        0,
        &catalog_with("sales", &["id"]),
    );

    let with = "WITH sales AS (SELECT * FROM sales WHERE sales._id_level <= -1),\
                r AS (SELECT * FROM regions)";
    assert_eq!(
        pair.condition_query.unwrap(),
        format!("{with} SELECT COUNT(*) > 0")
    );
    assert_eq!(
        pair.aggregate_query,
        format!(
            "{with} SELECT r.name, COUNT(*) FROM sales JOIN r ON sales.region = r.id GROUP BY r.name"
        )
    );
}

#[test]
fn test_several_tables_and_keys() {
    let mut a = SamplingTableDefinition::new("a");
    a.push_key("id", "_id_level");
    let mut b = SamplingTableDefinition::new("b");
    b.push_key("id", "_id_level");
    let mut c = SamplingTableDefinition::new("c");
    c.push_key("id", "_id_level");
    c.push_key("k", "_k_level");
    let catalog = Catalog::from_definitions([a, b, c]);

    let pair = rewrite(
        "SELECT SAMPLE(id -> a AS x, b, k -> c) UNTIL(1 = 1) SELECT * FROM x, b, c",
        2,
        &catalog,
    );

    assert_eq!(
        pair.condition_query.unwrap(),
        "WITH x AS (SELECT * FROM a WHERE a._id_level <= -3),\
         b AS (SELECT * FROM b WHERE b._id_level <= -3),\
         c AS (SELECT * FROM c WHERE c._k_level <= -3) SELECT 1 = 1"
    );
}

#[test]
fn test_keys_and_tables_resolve_loosely() {
    let pair = rewrite(
        "SELECT SAMPLE(\"ID\" -> public.Sales AS s) UNTIL(1 = 1) SELECT COUNT(*) FROM s",
        4,
        &catalog_with("sales", &["id"]),
    );
    assert!(pair
        .aggregate_query
        .starts_with("WITH s AS (SELECT * FROM public.Sales WHERE public.Sales._id_level <= -5)"));
}

#[test]
fn test_unknown_table_or_key() {
    let catalog = catalog_with("sales", &["id"]);
    let compiler = cte("SELECT SAMPLE(id -> orders) UNTIL(1 = 1) SELECT 1 FROM orders");
    let err = compiler.rewrite(0, &catalog).unwrap_err();
    assert!(matches!(
        err,
        SsqlError::Semantic(SemanticError::NotAUnitKey { ref key, ref table })
            if key == "id" && table == "orders"
    ));
}

#[test]
fn test_this_expands_to_owning_select() {
    let pair = rewrite(
        "SELECT SAMPLE(id -> t AS s) SELECT * FROM \
         (SELECT UNTIL((SELECT COUNT(*) FROM THIS) >= 5) \
         SELECT g, COUNT(*) AS c FROM s WHERE v > 0 GROUP BY g) q",
        4,
        &catalog_with("t", &["id"]),
    );

    let with = "WITH s AS (SELECT * FROM t WHERE t._id_level <= -5)";
    assert_eq!(
        pair.condition_query.unwrap(),
        format!("{with} SELECT (SELECT COUNT(*) FROM (SELECT * FROM s WHERE v > 0) AS THIS) >= 5")
    );
    assert_eq!(
        pair.aggregate_query,
        format!("{with} SELECT * FROM ( SELECT g, COUNT(*) AS c FROM s WHERE v > 0 GROUP BY g) q")
    );
}

#[test]
fn test_this_without_select_core_is_unresolved() {
    let compiler = cte(
        "SELECT SAMPLE(id -> t) SELECT * FROM \
         (SELECT UNTIL((SELECT COUNT(*) FROM THIS) > 1) (SELECT a FROM t)) q",
    );
    let err = compiler.rewrite(0, &catalog_with("t", &["id"])).unwrap_err();
    assert!(matches!(
        err,
        SsqlError::Semantic(SemanticError::UnresolvedThis)
    ));
}

#[test]
fn test_this_outside_until_is_left_alone() {
    let pair = rewrite(
        "SELECT SAMPLE(id -> t) UNTIL(1 = 1) SELECT this FROM t",
        0,
        &catalog_with("t", &["id"]),
    );
    assert!(pair.aggregate_query.ends_with("SELECT this FROM t"));
}

#[test]
fn test_sampling_comments_hide_the_header() {
    let pair = rewrite(
        "/*< SELECT SAMPLE(id -> t AS s) UNTIL(1 = 1) >*/ SELECT COUNT(*) FROM s",
        3,
        &catalog_with("t", &["id"]),
    );
    assert_eq!(
        pair.aggregate_query,
        "WITH s AS (SELECT * FROM t WHERE t._id_level <= -4) SELECT COUNT(*) FROM s"
    );
}

#[test]
fn test_rewrite_is_idempotent() {
    let sql = "SELECT SAMPLE(id -> t AS s) UNTIL(COUNT(*) > 3) SELECT AVG(v) FROM s";
    let catalog = catalog_with("t", &["id"]);
    let compiler = cte(sql);
    let first = compiler.rewrite(7, &catalog).unwrap();
    let second = compiler.rewrite(7, &catalog).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, cte(sql).rewrite(7, &catalog).unwrap());
}

#[test]
fn test_mode_follows_flag() {
    assert_eq!(cte("SELECT 1").mode(), EmissionMode::Cte);
    let compiler = SamplingCompiler::new("SELECT 1", Dialect::Postgres, 8, true).unwrap();
    assert_eq!(compiler.mode(), EmissionMode::InlineView);
    assert_eq!(compiler.num_levels(), 8);
}

#[test]
fn test_validation_errors() {
    let cases = [
        (
            "SELECT SAMPLE(id -> t) UNTIL(1=1) SELECT 1; SELECT 2",
            "multiple statements are not supported",
        ),
        (
            "SELECT SAMPLE(id -> t) UNTIL(1=1) DELETE FROM t",
            "'DELETE' is unsupported with sampling",
        ),
        (
            "WITH RECURSIVE r AS (SELECT 1) SELECT SAMPLE(id -> t) UNTIL(1=1) SELECT 1",
            "'RECURSIVE' is unsupported with sampling",
        ),
        (
            "SELECT SAMPLE(id -> t) UNTIL((SELECT COUNT(*) FROM THIS) > 0) SELECT 1",
            "can't use THIS in the top UNTIL clause",
        ),
        (
            "SELECT UNTIL(1=1) SELECT * FROM (SELECT SAMPLE(id -> t) SELECT 1) q",
            "SAMPLE clause must belong to the top-level SELECT",
        ),
    ];
    for (sql, message) in cases {
        let err = SamplingCompiler::new(sql, Dialect::Generic, 32, false).unwrap_err();
        assert_eq!(err.to_string(), message, "{sql}");
    }
}

#[test]
fn test_misplaced_sample_is_a_syntax_error() {
    let err = SamplingCompiler::new(
        "SELECT a, SAMPLE(id -> t) UNTIL(1=1) SELECT 1",
        Dialect::Generic,
        32,
        false,
    )
    .unwrap_err();
    assert!(matches!(err, SsqlError::Syntax { line: 1, .. }));
}
