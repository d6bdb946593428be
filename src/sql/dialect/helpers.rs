//! Shared helper functions for SQL dialect implementations.
//!
//! Dialects compose these to implement `SqlDialect` without repeating
//! the quoting and detection rules.

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, Redshift, Generic
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
/// Used by: All dialects
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Connection URLs
// =============================================================================

/// Prefix a sampling-enabled connection URL may carry in front of the
/// underlying database URL.
pub const SAMPLING_URL_PREFIX: &str = "sample:";

/// Strip the optional sampling prefix from a connection URL.
pub fn strip_sampling_prefix(url: &str) -> &str {
    let trimmed = url.trim();
    match trimmed.get(..SAMPLING_URL_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(SAMPLING_URL_PREFIX) => {
            &trimmed[SAMPLING_URL_PREFIX.len()..]
        }
        _ => trimmed,
    }
}

/// Whether `url` starts with any of `prefixes`, ignoring ASCII case.
pub fn has_url_prefix(url: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| {
        url.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}
