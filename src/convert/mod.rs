//! Table conversion compiler.
//!
//! Turns `CREATE TABLE ... SAMPLEKEY (...)` into the statements that build a
//! sampling table: a staging table with level columns, the catalog table, a
//! catalog row per unit key, a migration that fills the level columns, and
//! any clustering the dialect wants.
//!
//! Conversion runs in two passes. [`inspect`] reads the statement into an
//! immutable [`TableInspection`]; [`generate`] turns that into a
//! [`ConversionPlan`] without touching any shared state.
//!
//! # Example
//!
//! ```ignore
//! use ssql::convert::TableConverter;
//! use ssql::sql::Dialect;
//!
//! let converter = TableConverter::new("CREATE TABLE t (id INT, SAMPLEKEY(id))", Dialect::Generic)?;
//! let plan = converter.plan()?;
//! assert_eq!(plan.staging_create, "CREATE TABLE t (_id_level SMALLINT, id INT)");
//! ```

pub mod generate;
pub mod inspect;

pub use generate::{ConversionPlan, LEVEL_SUM_COLUMN};
pub use inspect::{ColumnSpec, KeySpec, TableInspection};

use crate::error::{SemanticError, SsqlError, SsqlResult};
use crate::sql::dialect::Dialect;
use crate::syntax::tree::{Kind, Node};
use crate::syntax::{lex, parse_create_table, strip_sampling_comments};

/// A parsed and inspected `CREATE TABLE` statement.
#[derive(Debug, Clone)]
pub struct TableConverter {
    dialect: Dialect,
    statement: Node,
    inspection: TableInspection,
}

impl TableConverter {
    /// Parse and inspect `sql`.
    pub fn new(sql: &str, dialect: Dialect) -> SsqlResult<Self> {
        let sql = strip_sampling_comments(sql);
        let statement = parse_create_table(&lex(&sql, dialect)?)?;
        let create = statement
            .as_branch()
            .and_then(|s| s.child(Kind::CreateTable))
            .ok_or_else(|| SsqlError::syntax(1, 1, "expected CREATE TABLE"))?;
        let inspection = TableInspection::from_tree(create)?;
        Ok(Self {
            dialect,
            statement,
            inspection,
        })
    }

    pub fn inspection(&self) -> &TableInspection {
        &self.inspection
    }

    /// Whether the statement declares any unit key.
    pub fn has_sample_key(&self) -> bool {
        !self.inspection.unit_keys.is_empty()
    }

    /// Generate the conversion statements.
    pub fn plan(&self) -> SsqlResult<ConversionPlan> {
        if !self.has_sample_key() {
            return Err(SemanticError::MissingSampleKey.into());
        }
        generate::generate(&self.inspection, &self.statement, self.dialect)
    }
}

/// Convert one statement in a single call.
pub fn convert(sql: &str, dialect: Dialect) -> SsqlResult<ConversionPlan> {
    TableConverter::new(sql, dialect)?.plan()
}
