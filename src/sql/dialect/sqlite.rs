//! SQLite SQL dialect.
//!
//! SQLite features used by sampling:
//! - ANSI identifier quoting (`"`)
//! - No XOR operator; `a ^ b` is spelled `(a | b) - (a & b)`
//! - Savepoints inside transactions
//! - A CTE named after the table it reads is a circular reference, so
//!   sampled tables are exposed as inline views

use sqlparser::dialect::SQLiteDialect;

use super::helpers;
use super::SqlDialect;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn bitwise_xor(&self, left: &str, right: &str) -> String {
        format!("(({left} | {right}) - ({left} & {right}))")
    }

    fn url_prefixes(&self) -> &'static [&'static str] {
        &["sqlite:", "jdbc:sqlite:"]
    }

    fn parser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        Box::new(SQLiteDialect {})
    }

    fn prefers_inline_view(&self) -> bool {
        true
    }

    fn supports_savepoints(&self) -> bool {
        true
    }
}
