//! SQLite adapter backed by rusqlite.
//!
//! The level expressions of a conversion call `LOG` (base 10) and `FLOOR`,
//! which SQLite only ships when built with its math functions. Every
//! connection registers its own deterministic versions.

use std::path::Path;

use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use super::{Database, DbError, DbResult, Rows, Value, SQLSTATE_DUPLICATE_TABLE};

/// A SQLite connection.
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(map_error)?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory().map_err(map_error)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> DbResult<Self> {
        register_math_functions(&conn).map_err(map_error)?;
        Ok(Self { conn })
    }

    /// Start an explicit transaction, leaving autocommit mode until the
    /// next commit.
    pub fn begin(&mut self) -> DbResult<()> {
        self.conn.execute_batch("BEGIN").map_err(map_error)
    }
}

fn register_math_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
    conn.create_scalar_function("LOG", 1, flags, |ctx| {
        let x: Option<f64> = ctx.get(0)?;
        Ok(x.map(f64::log10))
    })?;
    conn.create_scalar_function("FLOOR", 1, flags, |ctx| {
        let x: Option<f64> = ctx.get(0)?;
        Ok(x.map(f64::floor))
    })
}

/// SQLite reports no SQLSTATE; derive the one callers branch on from the
/// message.
fn map_error(err: rusqlite::Error) -> DbError {
    let message = err.to_string();
    if message.contains("already exists") {
        DbError::with_sqlstate(SQLSTATE_DUPLICATE_TABLE, message)
    } else {
        DbError::new(message)
    }
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl Database for SqliteDatabase {
    fn execute(&mut self, sql: &str) -> DbResult<u64> {
        let changed = self.conn.execute(sql, []).map_err(map_error)?;
        Ok(changed as u64)
    }

    fn query(&mut self, sql: &str) -> DbResult<Rows> {
        let mut stmt = self.conn.prepare(sql).map_err(map_error)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([]).map_err(map_error)?;
        while let Some(row) = cursor.next().map_err(map_error)? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(to_value(row.get_ref(i).map_err(map_error)?));
            }
            rows.push(values);
        }
        Ok(Rows::new(columns, rows))
    }

    fn is_autocommit(&self) -> bool {
        self.conn.is_autocommit()
    }

    fn savepoint(&mut self, name: &str) -> DbResult<()> {
        self.conn
            .execute_batch(&format!("SAVEPOINT {name}"))
            .map_err(map_error)
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> DbResult<()> {
        self.conn
            .execute_batch(&format!("ROLLBACK TO SAVEPOINT {name}"))
            .map_err(map_error)
    }

    fn release_savepoint(&mut self, name: &str) -> DbResult<()> {
        self.conn
            .execute_batch(&format!("RELEASE SAVEPOINT {name}"))
            .map_err(map_error)
    }

    fn commit(&mut self) -> DbResult<()> {
        self.conn.execute_batch("COMMIT").map_err(map_error)
    }
}
