//! Hash and level scheme for sampling tables.
//!
//! Each unit key value is hashed with a fixed universal hash and the hash is
//! bucketed into a negative level: `-32` for a zero hash, otherwise
//! `-31 + floor(log2(hash))`. A query at target level `T` keeps rows whose
//! level is at most `!T`, which admits a `2^-T` fraction of the keys.
//!
//! The same formulas are available as Rust functions and as SQL builders so
//! conversions, queries and tests all agree on one definition.

pub mod params;

use crate::error::{SsqlError, SsqlResult};
use crate::sql::token::{Token, TokenStream};

pub use params::{HASH_A, HASH_B, HASH_P, HASH_PARAMETER_COUNT};

/// Level assigned to a zero hash.
pub const MIN_LEVEL: i16 = -32;

/// Most target levels a search can probe; one per possible hash bit.
pub const MAX_LEVELS: u32 = 32;

/// Mask applied to key values before hashing.
pub const KEY_MASK: i64 = 0xFFFF_FFFF;

/// `log10(2)`, used to take base-2 logarithms with `LOG`.
pub const LOG10_2: f64 = 0.301029995663981;

/// Base of the `_FACTOR` scaling multiplier.
pub const FACTOR_BASE: f64 = 2.0;

fn parameters(index: usize) -> SsqlResult<(i64, i64)> {
    if index >= HASH_PARAMETER_COUNT {
        return Err(SsqlError::HashParameterLimit {
            index,
            limit: HASH_PARAMETER_COUNT,
        });
    }
    Ok((HASH_A[index], HASH_B[index]))
}

/// Hash one key component with the parameter pair at `index`.
pub fn hash_component(index: usize, x: i64) -> SsqlResult<u32> {
    let (a, b) = parameters(index)?;
    // a < 2^31 and the masked value < 2^32, so this stays inside i64
    let h = (a * (x & KEY_MASK) + b) % HASH_P;
    Ok(h as u32)
}

/// XOR of the component hashes of a composite key whose first component uses
/// parameter index `first`.
pub fn composite_hash(first: usize, xs: &[i64]) -> SsqlResult<u32> {
    xs.iter()
        .enumerate()
        .try_fold(0u32, |acc, (i, &x)| Ok(acc ^ hash_component(first + i, x)?))
}

/// Level of a hash value.
pub fn level_for_hash(h: u32) -> i16 {
    // -31 + floor(log2 h) == -(leading zeros), and 32 leading zeros for 0
    -(h.leading_zeros() as i16)
}

/// Inclusive upper level bound for target level `target`.
pub fn level_bound(target: u32) -> i32 {
    !(target as i32)
}

/// Multiplier that scales an aggregate over the sample at `target` back up.
pub fn factor(base: f64, target: u32) -> f64 {
    base.powi(target as i32)
}

// =============================================================================
// SQL builders
// =============================================================================

fn component_hash_sql(index: usize, column: &str) -> SsqlResult<TokenStream> {
    let (a, b) = parameters(index)?;
    let mut ts = TokenStream::new();
    ts.push(Token::Cast)
        .lparen()
        .lparen()
        .lparen()
        .push(Token::LitInt(a))
        .space()
        .push(Token::Mul)
        .space()
        .lparen()
        .ident(column)
        .space()
        .push(Token::BitAnd)
        .space()
        .push(Token::Cast)
        .lparen()
        .push(Token::LitInt(KEY_MASK))
        .space()
        .push(Token::As)
        .space()
        .push(Token::BigInt)
        .rparen()
        .rparen()
        .space()
        .push(Token::Plus)
        .space()
        .push(Token::LitInt(b))
        .rparen()
        .space()
        .push(Token::Mod)
        .space()
        .push(Token::LitInt(HASH_P))
        .rparen()
        .space()
        .push(Token::As)
        .space()
        .push(Token::Integer)
        .rparen();
    Ok(ts)
}

/// Hash expression for a unit key whose components are `columns`, the first
/// using parameter index `first`.
///
/// A single column gives `CAST(((A * (x & CAST(4294967295 AS BIGINT)) + B) % P) AS INTEGER)`;
/// several columns give the left-nested XOR of those expressions.
pub fn hash_sql(first: usize, columns: &[String]) -> SsqlResult<TokenStream> {
    let parts = columns
        .iter()
        .enumerate()
        .map(|(i, column)| component_hash_sql(first + i, column))
        .collect::<SsqlResult<Vec<_>>>()?;

    let mut parts = parts.into_iter();
    let first = parts.next().unwrap_or_default();
    Ok(parts.fold(first, |acc, part| TokenStream::from(Token::Xor(acc, part))))
}

/// Level expression over the hash column `hash_column`.
pub fn level_sql(hash_column: &str) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Case)
        .space()
        .push(Token::When)
        .space()
        .ident(hash_column)
        .push(Token::Eq)
        .push(Token::LitInt(0))
        .space()
        .push(Token::Then)
        .space()
        .push(Token::LitInt(MIN_LEVEL.into()))
        .space()
        .push(Token::Else)
        .space()
        .push(Token::LitInt(-31))
        .space()
        .push(Token::Plus)
        .space()
        .push(Token::Cast)
        .lparen()
        .push(Token::Floor)
        .lparen()
        .push(Token::Log)
        .lparen()
        .ident(hash_column)
        .rparen()
        .push(Token::Div)
        .push(Token::Cast)
        .lparen()
        .push(Token::LitFloat(LOG10_2))
        .space()
        .push(Token::As)
        .space()
        .push(Token::DoublePrecision)
        .rparen()
        .rparen()
        .space()
        .push(Token::As)
        .space()
        .push(Token::SmallInt)
        .rparen()
        .space()
        .push(Token::End);
    ts
}

/// `table.level_column <= !target`
pub fn level_filter_sql(table: &str, level_column: &str, target: u32) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.ident(table)
        .push(Token::Dot)
        .ident(level_column)
        .space()
        .push(Token::Lte)
        .space()
        .push(Token::LitInt(level_bound(target).into()));
    ts
}
