#[path = "../common/mod.rs"]
mod common;

use common::{boolean, ScriptedDb};
use ssql::db::Rows;
use ssql::error::{ConditionError, SsqlError};
use ssql::executor::search;
use ssql::rewrite::QueryPair;

fn pair(level: u32) -> QueryPair {
    QueryPair {
        level,
        condition_query: Some(format!("SELECT cond [L{level}]")),
        aggregate_query: format!("SELECT agg [L{level}]"),
    }
}

#[test]
fn test_stops_at_first_satisfied_level() {
    let mut db = ScriptedDb::new()
        .answer("[L3]", [boolean(false)])
        .answer("[L2]", [boolean(false)])
        .answer("[L1]", [boolean(true)]);

    let result = search(&mut db, 4, |level| Ok(pair(level))).unwrap();

    assert_eq!(result.pair.level, 1);
    assert_eq!(result.probes, 3);
    assert_eq!(
        db.calls,
        vec!["SELECT cond [L3]", "SELECT cond [L2]", "SELECT cond [L1]"]
    );
}

#[test]
fn test_levels_probed_once_in_descending_order() {
    let mut db = ScriptedDb::new().answer("cond", (0..8).map(|_| boolean(false)));
    let mut requested = Vec::new();

    let err = search(&mut db, 8, |level| {
        requested.push(level);
        Ok(pair(level))
    })
    .unwrap_err();

    assert!(matches!(err, SsqlError::RefinementExhausted { levels: 8 }));
    assert_eq!(requested, vec![7, 6, 5, 4, 3, 2, 1, 0]);
    assert!(db.calls.iter().all(|sql| !sql.contains("agg")));
}

#[test]
fn test_missing_condition_terminates_without_probing() {
    let mut db = ScriptedDb::new();
    let result = search(&mut db, 32, |level| {
        Ok(QueryPair {
            condition_query: None,
            ..pair(level)
        })
    })
    .unwrap();

    assert_eq!(result.pair.level, 31);
    assert_eq!(result.probes, 0);
    assert!(db.calls.is_empty());
}

#[test]
fn test_malformed_condition_results() {
    let mut db = ScriptedDb::new().answer("cond", [Rows::new(vec!["c".into()], vec![])]);
    let err = search(&mut db, 4, |level| Ok(pair(level))).unwrap_err();
    assert!(matches!(
        err,
        SsqlError::MalformedCondition(ConditionError::EmptyResult)
    ));

    let mut db = ScriptedDb::new().answer(
        "cond",
        [Rows::new(
            vec!["c".into()],
            vec![vec![ssql::db::Value::Float(0.5)]],
        )],
    );
    let err = search(&mut db, 4, |level| Ok(pair(level))).unwrap_err();
    assert_eq!(
        err.to_string(),
        "result is not boolean for condition query: float"
    );
}

#[test]
fn test_database_errors_propagate() {
    let mut db = ScriptedDb::new();
    let err = search(&mut db, 4, |level| Ok(pair(level))).unwrap_err();
    assert!(err.is_database());
}

#[test]
fn test_rewrite_errors_stop_the_search() {
    let mut db = ScriptedDb::new().answer("[L3]", [boolean(false)]);
    let err = search(&mut db, 4, |level| {
        if level == 2 {
            Err(SsqlError::InvalidLevel {
                level,
                num_levels: 2,
            })
        } else {
            Ok(pair(level))
        }
    })
    .unwrap_err();
    assert!(matches!(err, SsqlError::InvalidLevel { level: 2, .. }));
    assert_eq!(db.calls.len(), 1);
}
