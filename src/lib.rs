//! # ssql
//!
//! Sampling SQL: a dialect compiler and adaptive sampling engine.
//!
//! ## Architecture
//!
//! Two statements extend plain SQL:
//!
//! ```text
//! CREATE TABLE sales (id INT, amount INT, SAMPLEKEY(id))
//!     │
//!     ▼ [convert]  staging table + level columns, catalog row, migration
//!
//! SELECT SAMPLE(id -> sales) UNTIL((SELECT COUNT(*) FROM sales) >= 1000)
//! SELECT SUM(amount) * _FACTOR FROM sales
//!     │
//!     ▼ [rewrite]  condition + aggregate query per level
//!     │
//!     ▼ [executor] probe levels from finest to coarsest until the
//!                  condition holds, then run the aggregate
//! ```
//!
//! Rows are bucketed into levels by a fixed universal hash of their unit
//! key ([`sampling`]); a query at level `T` reads the `2^-T` fraction of
//! keys whose level is at most `!T`. [`engine::Engine`] ties it together
//! for one connection and passes every other statement through.

pub mod catalog;
pub mod config;
pub mod convert;
pub mod db;
pub mod engine;
pub mod error;
pub mod executor;
pub mod rewrite;
pub mod sampling;
pub mod sql;
pub mod syntax;

pub use error::{ConditionError, SemanticError, SsqlError, SsqlResult};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{Catalog, SamplingTableDefinition, UnitKey};
    pub use crate::convert::{convert, ConversionPlan, TableConverter};
    pub use crate::db::{Database, DbError, Rows, SqliteDatabase, Value};
    pub use crate::engine::{Engine, Outcome, TransactionPolicy};
    pub use crate::error::{SsqlError, SsqlResult};
    pub use crate::rewrite::{QueryPair, SamplingCompiler};
    pub use crate::sql::{Dialect, SqlDialect};
}

// Also export at crate root for convenience
pub use engine::Engine;
pub use rewrite::{QueryPair, SamplingCompiler};
pub use sql::Dialect;
