//! Scripted database shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use ssql::catalog::{Catalog, SamplingTableDefinition};
use ssql::db::{Database, DbError, DbResult, Rows, Value};

/// Records every call and answers from a script.
///
/// Statements and transaction calls (`SAVEPOINT x`, `COMMIT`, ...) fail when
/// they contain a fragment registered with [`ScriptedDb::fail_when`]. Queries
/// are answered by the first registered fragment they contain that still has
/// rows queued.
#[derive(Debug, Default)]
pub struct ScriptedDb {
    pub calls: Vec<String>,
    pub autocommit: bool,
    failures: Vec<(String, DbError)>,
    answers: Vec<(String, VecDeque<Rows>)>,
}

impl ScriptedDb {
    pub fn new() -> Self {
        Self {
            autocommit: true,
            ..Default::default()
        }
    }

    pub fn in_transaction(mut self) -> Self {
        self.autocommit = false;
        self
    }

    pub fn fail_when(mut self, fragment: &str, error: DbError) -> Self {
        self.failures.push((fragment.to_string(), error));
        self
    }

    pub fn answer(mut self, fragment: &str, rows: impl IntoIterator<Item = Rows>) -> Self {
        self.answers
            .push((fragment.to_string(), rows.into_iter().collect()));
        self
    }

    fn record(&mut self, call: String) -> DbResult<()> {
        let failure = self
            .failures
            .iter()
            .find(|(fragment, _)| call.contains(fragment.as_str()))
            .map(|(_, err)| err.clone());
        self.calls.push(call);
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Database for ScriptedDb {
    fn execute(&mut self, sql: &str) -> DbResult<u64> {
        self.record(sql.to_string())?;
        Ok(0)
    }

    fn query(&mut self, sql: &str) -> DbResult<Rows> {
        self.record(sql.to_string())?;
        self.answers
            .iter_mut()
            .find(|(fragment, queue)| sql.contains(fragment.as_str()) && !queue.is_empty())
            .and_then(|(_, queue)| queue.pop_front())
            .ok_or_else(|| DbError::new(format!("no scripted answer for: {sql}")))
    }

    fn is_autocommit(&self) -> bool {
        self.autocommit
    }

    fn savepoint(&mut self, name: &str) -> DbResult<()> {
        self.record(format!("SAVEPOINT {name}"))
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> DbResult<()> {
        self.record(format!("ROLLBACK TO SAVEPOINT {name}"))
    }

    fn release_savepoint(&mut self, name: &str) -> DbResult<()> {
        self.record(format!("RELEASE SAVEPOINT {name}"))
    }

    fn commit(&mut self) -> DbResult<()> {
        self.record("COMMIT".to_string())
    }
}

/// One row, one boolean column.
pub fn boolean(value: bool) -> Rows {
    Rows::new(vec!["c".into()], vec![vec![Value::Bool(value)]])
}

/// Rows shaped like the catalog load query.
pub fn catalog_rows(entries: &[(&str, &str, &str)]) -> Rows {
    Rows::new(
        vec!["TABLE_NAME".into(), "KEY_NAME".into(), "LEVEL_NAME".into()],
        entries
            .iter()
            .map(|(table, key, level)| {
                vec![
                    Value::Text(table.to_string()),
                    Value::Text(key.to_string()),
                    Value::Text(level.to_string()),
                ]
            })
            .collect(),
    )
}

/// Catalog with one table and its keys, levels named `_<key>_level`.
pub fn catalog_with(table: &str, keys: &[&str]) -> Catalog {
    let mut def = SamplingTableDefinition::new(table);
    for key in keys {
        def.push_key(*key, format!("_{key}_level"));
    }
    Catalog::from_definitions([def])
}

/// Duplicate-table error as Postgres reports it.
pub fn duplicate_table() -> DbError {
    DbError::with_sqlstate("42P07", "relation \"_sample_key_defs\" already exists")
}
