//! First conversion pass: read what a `CREATE TABLE` declares.

use crate::error::{SemanticError, SsqlResult};
use crate::sql::ident;
use crate::syntax::tree::{Branch, Kind};

/// A declared column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: String,
}

/// A declared unit key and the columns it hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    pub name: String,
    pub components: Vec<String>,
}

impl KeySpec {
    pub fn level_column(&self) -> String {
        ident::level_column(&self.name)
    }

    pub fn hash_column(&self) -> String {
        ident::hash_column(&self.name)
    }
}

/// Everything the generator needs from the statement, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInspection {
    /// Target table name as written.
    pub table_name: String,
    /// Table rows migrate from; the target itself unless a `FROM` trailer
    /// names another.
    pub source_table: String,
    pub columns: Vec<ColumnSpec>,
    pub unit_keys: Vec<KeySpec>,
    /// Columns marked with a `SORTKEY` option or listed in a `SORTKEY` clause.
    pub sort_keys: Vec<String>,
}

impl TableInspection {
    /// Inspect a parsed `CreateTable` branch.
    pub fn from_tree(create: &Branch) -> SsqlResult<Self> {
        let table_name = create
            .child(Kind::CreateTableName)
            .map(Branch::code)
            .unwrap_or_default();
        let source_table = create
            .child(Kind::SourceClause)
            .and_then(|c| c.child(Kind::SourceTableName))
            .map(Branch::code)
            .unwrap_or_else(|| table_name.clone());

        let mut inspection = Self {
            table_name,
            source_table,
            columns: Vec::new(),
            unit_keys: Vec::new(),
            sort_keys: Vec::new(),
        };

        if let Some(body) = create.child(Kind::TableBody) {
            for element in body.children_of(Kind::TableElement) {
                if let Some(column) = element.child(Kind::ColumnDef) {
                    inspection.add_column(column);
                }
                if let Some(clause) = element.child(Kind::SampleKeyClause) {
                    inspection.add_sample_keys(clause)?;
                }
                if let Some(clause) = element.child(Kind::SortKeyClause) {
                    inspection.add_sort_keys(clause);
                }
            }
        }
        for clause in create.children_of(Kind::SortKeyClause) {
            inspection.add_sort_keys(clause);
        }
        Ok(inspection)
    }

    fn add_column(&mut self, column: &Branch) {
        let name = column
            .child(Kind::ColumnName)
            .map(Branch::code)
            .unwrap_or_default();
        let data_type = column
            .child(Kind::DataType)
            .map(Branch::code)
            .unwrap_or_default();
        if column
            .children_of(Kind::ColumnOption)
            .any(|opt| opt.first_leaf().is_some_and(|l| l.is_word("SORTKEY")))
        {
            self.sort_keys.push(name.clone());
        }
        self.columns.push(ColumnSpec { name, data_type });
    }

    fn add_sample_keys(&mut self, clause: &Branch) -> SsqlResult<()> {
        for item in clause.children_of(Kind::SampleKeyItem) {
            let components: Vec<String> = item
                .child(Kind::KeyExpr)
                .map(|expr| expr.children_of(Kind::ColumnName).map(Branch::code).collect())
                .unwrap_or_default();
            let name = match item.child(Kind::KeyAlias) {
                Some(alias) => alias.code(),
                None => components.first().cloned().unwrap_or_default(),
            };
            if self.unit_keys.iter().any(|k| ident::same(&k.name, &name)) {
                return Err(SemanticError::DuplicateUnitKey(name).into());
            }
            self.unit_keys.push(KeySpec { name, components });
        }
        Ok(())
    }

    fn add_sort_keys(&mut self, clause: &Branch) {
        self.sort_keys
            .extend(clause.children_of(Kind::ColumnName).map(Branch::code));
    }

    /// Data type of a column, found by normalized name.
    pub fn column_type(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| ident::same(&c.name, name))
            .map(|c| c.data_type.as_str())
    }

    /// Level columns in key order.
    pub fn level_columns(&self) -> Vec<String> {
        self.unit_keys.iter().map(KeySpec::level_column).collect()
    }

    /// Whether a `_LEVEL_SUM` column is needed.
    pub fn has_level_sum(&self) -> bool {
        self.unit_keys.len() > 1
    }
}
