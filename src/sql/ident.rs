//! Identifier helpers shared by the compilers and the catalog.
//!
//! Identifiers are carried around as the text the user wrote. A double-quoted
//! identifier is case-sensitive; anything else folds to lower case.

use super::dialect::helpers;

/// Whether `s` is a double-quoted identifier.
pub fn is_quoted(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

/// Strip the quotes from a quoted identifier, collapsing `""` escapes.
/// Unquoted text is returned unchanged.
pub fn unquote(s: &str) -> String {
    if is_quoted(s) {
        s[1..s.len() - 1].replace("\"\"", "\"")
    } else {
        s.to_string()
    }
}

/// Comparison form of an identifier: quoted names keep their case, unquoted
/// names are lower-cased.
pub fn normalize(s: &str) -> String {
    if is_quoted(s) {
        unquote(s)
    } else {
        s.to_lowercase()
    }
}

/// Compare two identifiers the way the database would.
pub fn same(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Split a possibly qualified name on dots that are not inside quotes.
pub fn split_qualified(name: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in name.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                parts.push(name[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(name[start..].trim());
    parts
}

/// Last component of a qualified name, as written.
pub fn last_component(name: &str) -> &str {
    split_qualified(name).pop().unwrap_or(name)
}

fn affixed(key: &str, prefix: &str, suffix: &str) -> String {
    if is_quoted(key) {
        helpers::quote_double(&format!("{prefix}{}{suffix}", unquote(key)))
    } else {
        format!("{prefix}{key}{suffix}")
    }
}

/// Level column derived from a unit key: `_<key>_level`.
pub fn level_column(key: &str) -> String {
    affixed(key, "_", "_level")
}

/// Hash column derived from a unit key: `_<key>_hash`.
pub fn hash_column(key: &str) -> String {
    affixed(key, "_", "_hash")
}

/// `name` with `prefix` in front, inside the quotes when `name` is quoted.
pub fn prefixed(name: &str, prefix: &str) -> String {
    affixed(name, prefix, "")
}
