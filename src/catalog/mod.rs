//! Metadata catalog of converted sampling tables.
//!
//! Conversions record one row per unit key in `_SAMPLE_KEY_DEFS`. The
//! catalog reads that table once per engine and answers which columns of a
//! table are unit keys and where their level columns live.

use std::collections::HashMap;

use tracing::debug;

use crate::db::{Database, Value};
use crate::error::SsqlResult;
use crate::sql::ident;

/// Name of the persisted catalog table.
pub const CATALOG_TABLE: &str = "_SAMPLE_KEY_DEFS";

/// Query that reads the catalog in key order.
pub const LOAD_QUERY: &str =
    "SELECT TABLE_NAME,KEY_NAME,LEVEL_NAME FROM _SAMPLE_KEY_DEFS ORDER BY KEY_ORDER";

/// A unit key of a sampling table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitKey {
    /// Key name as declared.
    pub name: String,
    /// 0-based declaration position.
    pub ordinal: usize,
    /// Level column holding the key's bucket.
    pub level_column: String,
}

/// A converted sampling table and its unit keys in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingTableDefinition {
    pub table_name: String,
    pub unit_keys: Vec<UnitKey>,
}

impl SamplingTableDefinition {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            unit_keys: Vec::new(),
        }
    }

    /// Append a unit key. A key already present under the same normalized
    /// name is ignored.
    pub fn push_key(&mut self, name: impl Into<String>, level_column: impl Into<String>) {
        let name = name.into();
        if self.unit_key(&name).is_some() {
            return;
        }
        let ordinal = self.unit_keys.len();
        self.unit_keys.push(UnitKey {
            name,
            ordinal,
            level_column: level_column.into(),
        });
    }

    /// Look up a unit key, ignoring quotes and case.
    pub fn unit_key(&self, key: &str) -> Option<&UnitKey> {
        let wanted = catalog_key(key);
        self.unit_keys.iter().find(|k| catalog_key(&k.name) == wanted)
    }

    pub fn is_unit_key(&self, key: &str) -> bool {
        self.unit_key(key).is_some()
    }
}

/// Lookup form used by the catalog: unquoted and lower-cased.
fn catalog_key(name: &str) -> String {
    ident::unquote(name).to_lowercase()
}

/// In-memory index of sampling tables, keyed by unquoted lower-cased name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: HashMap<String, SamplingTableDefinition>,
    loaded: bool,
}

impl Catalog {
    /// Create an empty, unloaded catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a loaded catalog from definitions, without a database.
    pub fn from_definitions(defs: impl IntoIterator<Item = SamplingTableDefinition>) -> Self {
        let tables = defs
            .into_iter()
            .map(|def| (catalog_key(ident::last_component(&def.table_name)), def))
            .collect();
        Self {
            tables,
            loaded: true,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Read the catalog table. Does nothing once loaded.
    pub fn load<D: Database + ?Sized>(&mut self, db: &mut D) -> SsqlResult<()> {
        if self.loaded {
            return Ok(());
        }
        let rows = db.query(LOAD_QUERY)?;

        let mut tables: HashMap<String, SamplingTableDefinition> = HashMap::new();
        for row in &rows.rows {
            let (Some(table), Some(key), Some(level)) =
                (text(row.first()), text(row.get(1)), text(row.get(2)))
            else {
                debug!(?row, "skipping incomplete catalog row");
                continue;
            };
            tables
                .entry(catalog_key(ident::last_component(&table)))
                .or_insert_with(|| SamplingTableDefinition::new(table.as_str()))
                .push_key(key, level);
        }

        debug!(tables = tables.len(), "loaded sampling catalog");
        self.tables = tables;
        self.loaded = true;
        Ok(())
    }

    /// Discard what was loaded and read the catalog table again.
    pub fn reload<D: Database + ?Sized>(&mut self, db: &mut D) -> SsqlResult<()> {
        let mut fresh = Catalog::new();
        fresh.load(db)?;
        *self = fresh;
        Ok(())
    }

    /// Find a sampling table. Quotes and case are ignored and a qualified
    /// name is matched on its last component.
    pub fn resolve(&self, identifier: &str) -> Option<&SamplingTableDefinition> {
        self.tables
            .get(&catalog_key(ident::last_component(identifier)))
    }

    /// Whether `key` is a unit key of `table`.
    pub fn is_unit_key(&self, table: &str, key: &str) -> bool {
        self.resolve(table).is_some_and(|def| def.is_unit_key(key))
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Text(s) => Some(s.clone()),
        _ => None,
    }
}
