//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for the database
//! differences that matter to sampling. Each dialect implements `SqlDialect`:
//!
//! - Identifier and string quoting
//! - The bitwise XOR operator used to combine composite key hashes
//! - How a sampling table is physically ordered (index + CLUSTER, SORTKEY, nothing)
//! - Which inline-view mode a query rewrite defaults to
//! - How the catalog table is created inside an open transaction
//!
//! # Usage
//!
//! ```ignore
//! use ssql::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::detect("sample:jdbc:postgresql://localhost/db");
//! assert_eq!(dialect, Dialect::Postgres);
//! assert!(dialect.prefers_inline_view());
//! ```
//!
//! | Feature | PostgreSQL | Redshift | SQLite | Generic |
//! |---------|-----------|----------|--------|---------|
//! | Cluster index on levels | ✓ | ❌ | ❌ | ❌ |
//! | SORTKEY clause | ❌ | ✓ | ❌ | ❌ |
//! | XOR operator | `#` | `#` | emulated | `#` |
//! | Savepoints | ✓ | ❌ | ✓ | ❌ |
//! | Inline view by default | ✓ | ❌ | ✓ | ❌ |

mod generic;
pub mod helpers;
mod postgres;
mod redshift;
mod sqlite;

pub use generic::Generic;
pub use postgres::Postgres;
pub use redshift::Redshift;
pub use sqlite::Sqlite;

/// SQL dialect trait - defines how sampling SQL is rendered for a database.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// Bitwise XOR of two integer expressions, used to fold composite key
    /// hashes.
    ///
    /// - PostgreSQL/Redshift: `(a # b)`
    /// - SQLite: `((a | b) - (a & b))`, having no XOR operator
    fn bitwise_xor(&self, left: &str, right: &str) -> String {
        format!("({left} # {right})")
    }

    // =========================================================================
    // Detection
    // =========================================================================

    /// Connection URL prefixes that identify this dialect.
    fn url_prefixes(&self) -> &'static [&'static str];

    /// Parser dialect used to tokenize statements for this database.
    fn parser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect>;

    // =========================================================================
    // Sampling Table Layout
    // =========================================================================

    /// Whether the staging table gets a trailing `SORTKEY (...)` clause.
    ///
    /// - Redshift: true
    fn supports_sort_key_clause(&self) -> bool {
        false
    }

    /// Whether a cluster index is built and the table clustered on it after
    /// migration.
    ///
    /// - PostgreSQL: true
    fn clusters_sampling_table(&self) -> bool {
        false
    }

    /// Whether sampling queries default to inline views instead of CTEs.
    ///
    /// - PostgreSQL: true (CTEs are optimization fences before PG 12)
    fn prefers_inline_view(&self) -> bool {
        false
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Whether savepoints can guard a statement inside a transaction.
    fn supports_savepoints(&self) -> bool {
        false
    }

    /// Whether pending DDL must be committed before creating the catalog
    /// table, because a failed statement would abort the transaction.
    fn commits_before_catalog_ddl(&self) -> bool {
        false
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    Postgres,
    Redshift,
    Sqlite,
    #[default]
    Generic,
}

impl Dialect {
    /// All dialects, in detection order.
    pub const ALL: [Dialect; 4] = [
        Dialect::Postgres,
        Dialect::Redshift,
        Dialect::Sqlite,
        Dialect::Generic,
    ];

    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::Redshift => &Redshift,
            Dialect::Sqlite => &Sqlite,
            Dialect::Generic => &Generic,
        }
    }

    /// Classify a connection URL. An optional `sample:` prefix is ignored;
    /// anything unrecognized is generic.
    pub fn detect(url: &str) -> Dialect {
        let url = helpers::strip_sampling_prefix(url);
        Dialect::ALL
            .into_iter()
            .find(|d| helpers::has_url_prefix(url, d.url_prefixes()))
            .unwrap_or_default()
    }

    /// Parse a dialect name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Dialect::Postgres),
            "redshift" | "ar" => Some(Dialect::Redshift),
            "sqlite" | "sqlite3" => Some(Dialect::Sqlite),
            "generic" | "ansi" => Some(Dialect::Generic),
            _ => None,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn bitwise_xor(&self, left: &str, right: &str) -> String {
        self.dialect().bitwise_xor(left, right)
    }

    fn url_prefixes(&self) -> &'static [&'static str] {
        self.dialect().url_prefixes()
    }

    fn parser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        self.dialect().parser_dialect()
    }

    fn supports_sort_key_clause(&self) -> bool {
        self.dialect().supports_sort_key_clause()
    }

    fn clusters_sampling_table(&self) -> bool {
        self.dialect().clusters_sampling_table()
    }

    fn prefers_inline_view(&self) -> bool {
        self.dialect().prefers_inline_view()
    }

    fn supports_savepoints(&self) -> bool {
        self.dialect().supports_savepoints()
    }

    fn commits_before_catalog_ddl(&self) -> bool {
        self.dialect().commits_before_catalog_ddl()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
