//! Error types for the sampling compiler and engine.
//!
//! The kinds are closed so callers can match on them instead of parsing
//! messages. Database failures carry their SQLSTATE through unchanged.

use thiserror::Error;

use crate::db::DbError;

/// Result type for sampling operations.
pub type SsqlResult<T> = Result<T, SsqlError>;

/// Longest parser message kept in a syntax error.
const MAX_MESSAGE_LEN: usize = 160;

/// Errors raised while compiling or executing sampling SQL.
#[derive(Error, Debug)]
pub enum SsqlError {
    /// The input is not valid for the grammar.
    #[error("syntax error at line {line}, column {column}; {message}")]
    Syntax {
        line: u64,
        column: u64,
        message: String,
    },

    /// The input parses but combines the extension keywords illegally.
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    /// Every level was probed and the stopping condition never held.
    #[error("sample table did not satisfy stopping condition after {levels} levels")]
    RefinementExhausted { levels: u32 },

    /// A condition query returned something other than one boolean row.
    #[error(transparent)]
    MalformedCondition(#[from] ConditionError),

    /// The underlying database call failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// A target level outside `0..num_levels` was requested.
    #[error("target level {level} is outside 0..{num_levels}")]
    InvalidLevel { level: u32, num_levels: u32 },

    /// A unit key needs more hash parameters than the fixed tables hold.
    #[error("hash parameter index {index} exceeds the {limit} available parameters")]
    HashParameterLimit { index: usize, limit: usize },
}

impl SsqlError {
    /// Build a syntax error, truncating overly long parser messages.
    pub fn syntax(line: u64, column: u64, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.chars().count() > MAX_MESSAGE_LEN {
            message = message.chars().take(MAX_MESSAGE_LEN).collect::<String>() + "...";
        }
        Self::Syntax {
            line,
            column,
            message,
        }
    }

    /// Whether this error came from the database rather than the compiler.
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Misuse of the sampling extension keywords.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("SAMPLE keyword not found")]
    UntilWithoutSample,

    #[error("UNTIL keyword not found")]
    SampleWithoutUntil,

    #[error("can't use SAMPLE keyword more than once")]
    RepeatedSample,

    #[error("can't use UNTIL keyword more than once")]
    RepeatedUntil,

    #[error("'{0}' is unsupported with sampling")]
    UnsupportedKeyword(String),

    #[error("can't use THIS in the top UNTIL clause")]
    ThisInTopLevelUntil,

    #[error("THIS can't be resolved inside a SELECT nested in another UNTIL clause")]
    UnresolvedThis,

    #[error("SAMPLE clause must belong to the top-level SELECT")]
    NestedSample,

    #[error("{key} is not sample key of {table}")]
    NotAUnitKey { key: String, table: String },

    #[error("multiple statements are not supported")]
    MultipleStatements,

    #[error("SAMPLEKEY clause not found")]
    MissingSampleKey,

    #[error("sample key {0} is declared more than once")]
    DuplicateUnitKey(String),
}

/// Distinct ways a condition query can fail to produce a single boolean.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConditionError {
    #[error("DB returned empty rows for condition query")]
    EmptyResult,

    #[error("result is not boolean for condition query: {found}")]
    NotBoolean { found: String },

    #[error("DB returned multiple rows for condition query, the UNTIL clause may be wrong")]
    MultipleRows,
}
