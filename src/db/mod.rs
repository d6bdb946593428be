//! Database client abstraction.
//!
//! The engine never talks to a driver directly. Callers hand it anything
//! implementing [`Database`]; [`sqlite::SqliteDatabase`] is the adapter the
//! CLI and the integration tests use.

pub mod sqlite;

use serde::Serialize;
use thiserror::Error;

pub use sqlite::SqliteDatabase;

/// Result type for database calls.
pub type DbResult<T> = Result<T, DbError>;

/// SQLSTATE class for syntax errors and access rule violations, which
/// includes "object already exists".
pub const SQLSTATE_CLASS_SYNTAX_OR_ACCESS: &str = "42";

/// SQLSTATE for a duplicate table.
pub const SQLSTATE_DUPLICATE_TABLE: &str = "42P07";

/// Error reported by the database, with its SQLSTATE when the driver gives one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DbError {
    pub sqlstate: Option<String>,
    pub message: String,
}

impl DbError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            sqlstate: None,
            message: message.into(),
        }
    }

    pub fn with_sqlstate(sqlstate: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sqlstate: Some(sqlstate.into()),
            message: message.into(),
        }
    }

    /// Whether the SQLSTATE falls in class `42`, which is where a
    /// duplicate object is reported.
    pub fn is_duplicate_object(&self) -> bool {
        self.sqlstate
            .as_deref()
            .is_some_and(|s| s.starts_with(SQLSTATE_CLASS_SYNTAX_OR_ACCESS))
    }
}

/// A single result cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
        }
    }
}

/// Result set of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rows {
    /// Result column names.
    pub columns: Vec<String>,
    /// Result data rows.
    pub rows: Vec<Vec<Value>>,
}

impl Rows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Synchronous connection the engine drives.
///
/// # Example
///
/// ```ignore
/// use ssql::db::{Database, SqliteDatabase};
///
/// let mut db = SqliteDatabase::open_in_memory()?;
/// db.execute("CREATE TABLE t (id INTEGER)")?;
/// let rows = db.query("SELECT COUNT(*) FROM t")?;
/// ```
pub trait Database {
    /// Run a statement that returns no rows. Returns the affected row count.
    fn execute(&mut self, sql: &str) -> DbResult<u64>;

    /// Run a query and collect its rows.
    fn query(&mut self, sql: &str) -> DbResult<Rows>;

    /// Whether every statement commits on its own.
    fn is_autocommit(&self) -> bool;

    // =========================================================================
    // Transactions
    // =========================================================================

    fn savepoint(&mut self, name: &str) -> DbResult<()>;

    fn rollback_to_savepoint(&mut self, name: &str) -> DbResult<()>;

    fn release_savepoint(&mut self, name: &str) -> DbResult<()>;

    fn commit(&mut self) -> DbResult<()>;
}

impl<D: Database + ?Sized> Database for &mut D {
    fn execute(&mut self, sql: &str) -> DbResult<u64> {
        (**self).execute(sql)
    }

    fn query(&mut self, sql: &str) -> DbResult<Rows> {
        (**self).query(sql)
    }

    fn is_autocommit(&self) -> bool {
        (**self).is_autocommit()
    }

    fn savepoint(&mut self, name: &str) -> DbResult<()> {
        (**self).savepoint(name)
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> DbResult<()> {
        (**self).rollback_to_savepoint(name)
    }

    fn release_savepoint(&mut self, name: &str) -> DbResult<()> {
        (**self).release_savepoint(name)
    }

    fn commit(&mut self) -> DbResult<()> {
        (**self).commit()
    }
}
