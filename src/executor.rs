//! Adaptive level search.
//!
//! Starting from the finest level, each probe runs the condition query of
//! that level's [`QueryPair`]. The first level whose condition holds wins;
//! otherwise the search moves one level coarser. Level 0 is the whole table,
//! so failing there means the condition can never hold.

use tracing::debug;

use crate::db::{Database, Rows, Value};
use crate::error::{ConditionError, SsqlError, SsqlResult};
use crate::rewrite::QueryPair;

/// Where a search stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Pair of the level whose condition held.
    pub pair: QueryPair,
    /// Condition queries issued.
    pub probes: u32,
}

/// Probe levels `num_levels - 1` down to `0`.
///
/// `pair_at` builds the pair for one level; it is called at most once per
/// level and never for a level already probed.
pub fn search<D, F>(db: &mut D, num_levels: u32, mut pair_at: F) -> SsqlResult<SearchResult>
where
    D: Database + ?Sized,
    F: FnMut(u32) -> SsqlResult<QueryPair>,
{
    let mut probes = 0;
    for level in (0..num_levels).rev() {
        let pair = pair_at(level)?;
        let Some(condition) = pair.condition_query.as_deref() else {
            debug!(level, "no condition query; stopping");
            return Ok(SearchResult { pair, probes });
        };

        probes += 1;
        let rows = db.query(condition)?;
        let holds = condition_holds(&rows)?;
        debug!(level, holds, "probed stopping condition");
        if holds {
            return Ok(SearchResult { pair, probes });
        }
    }
    Err(SsqlError::RefinementExhausted { levels: num_levels })
}

/// Read the single boolean a condition query must return.
pub fn condition_holds(rows: &Rows) -> Result<bool, ConditionError> {
    let row = match rows.rows.as_slice() {
        [] => return Err(ConditionError::EmptyResult),
        [row] => row,
        _ => return Err(ConditionError::MultipleRows),
    };
    let [value] = row.as_slice() else {
        return Err(ConditionError::NotBoolean {
            found: format!("{} columns", row.len()),
        });
    };
    as_bool(value).ok_or_else(|| ConditionError::NotBoolean {
        found: value.type_name().to_string(),
    })
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Null => Some(false),
        Value::Bool(b) => Some(*b),
        Value::Int(i) => Some(*i != 0),
        Value::Text(t) => match t.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "1" => Some(true),
            "f" | "false" | "0" => Some(false),
            _ => None,
        },
        Value::Float(_) | Value::Blob(_) => None,
    }
}
