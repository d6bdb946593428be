//! Inline views that stand in for sampled tables.

use std::fmt;

/// A filtered subquery plus the name it is exposed under.
///
/// Kept structured so a reference with its own alias or column list can
/// swap those in without touching the subquery text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineView {
    /// Parenthesized subquery, `(SELECT * FROM t WHERE ...)`.
    pub subquery: String,
    pub alias: String,
    /// Column alias list as written, parentheses included.
    pub columns: Option<String>,
}

impl InlineView {
    pub fn new(subquery: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            subquery: subquery.into(),
            alias: alias.into(),
            columns: None,
        }
    }

    /// The same view exposed under another alias and column list.
    pub fn renamed(&self, alias: impl Into<String>, columns: Option<String>) -> Self {
        Self {
            subquery: self.subquery.clone(),
            alias: alias.into(),
            columns,
        }
    }
}

impl fmt::Display for InlineView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.subquery, self.alias)?;
        if let Some(columns) = &self.columns {
            f.write_str(columns)?;
        }
        Ok(())
    }
}
