//! Generic SQL dialect.
//!
//! Used for any database that is neither PostgreSQL nor Redshift. Only the
//! portable subset is emitted: no clustering, no sort keys, no savepoints.

use sqlparser::dialect::GenericDialect;

use super::helpers;
use super::SqlDialect;

/// Generic SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Generic;

impl SqlDialect for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn url_prefixes(&self) -> &'static [&'static str] {
        &[]
    }

    fn parser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        Box::new(GenericDialect {})
    }
}
