//! Amazon Redshift SQL dialect.
//!
//! Redshift features used by sampling:
//! - PostgreSQL-based syntax
//! - ANSI identifier quoting (`"`)
//! - Table-level `SORTKEY (...)` instead of indexes
//! - No savepoints; DDL has to be committed before a failing statement

use sqlparser::dialect::PostgreSqlDialect;

use super::helpers;
use super::SqlDialect;

/// Amazon Redshift SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Redshift;

impl SqlDialect for Redshift {
    fn name(&self) -> &'static str {
        "redshift"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn url_prefixes(&self) -> &'static [&'static str] {
        &["jdbc:redshift:", "redshift://"]
    }

    // Redshift is Postgres-like as far as the parser is concerned
    fn parser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        Box::new(PostgreSqlDialect {})
    }

    fn supports_sort_key_clause(&self) -> bool {
        true
    }

    fn commits_before_catalog_ddl(&self) -> bool {
        true
    }
}
