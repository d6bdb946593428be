//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features used by sampling:
//! - ANSI identifier quoting (`"`)
//! - `#` as bitwise XOR
//! - Savepoints inside transactions
//! - `CLUSTER ... USING` to physically order a table by an index

use sqlparser::dialect::PostgreSqlDialect;

use super::helpers;
use super::SqlDialect;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn url_prefixes(&self) -> &'static [&'static str] {
        &["jdbc:postgresql:", "postgres://", "postgresql://"]
    }

    fn parser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        Box::new(PostgreSqlDialect {})
    }

    fn clusters_sampling_table(&self) -> bool {
        true
    }

    fn prefers_inline_view(&self) -> bool {
        true
    }

    fn supports_savepoints(&self) -> bool {
        true
    }
}
