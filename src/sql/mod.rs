//! SQL generation support.
//!
//! - [`ident`] - Identifier quoting, normalization and derived column names
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod ident;
pub mod token;

#[cfg(test)]
pub mod test_utils;

pub use dialect::{Dialect, SqlDialect};
pub use token::{Token, TokenStream};
