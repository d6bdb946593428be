//! Statement dispatch for one connection.
//!
//! The engine decides what a statement is and routes it:
//!
//! ```text
//! CREATE TABLE ... SAMPLEKEY  → convert → run plan under TransactionPolicy
//! SELECT SAMPLE ... UNTIL ... → rewrite → level search → aggregate query
//! anything else               → database, untouched
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ssql::db::SqliteDatabase;
//! use ssql::engine::{Engine, Outcome};
//! use ssql::sql::Dialect;
//!
//! let mut db = SqliteDatabase::open("sales.db")?;
//! let mut engine = Engine::new(Dialect::Generic);
//! let outcome = engine.execute(
//!     &mut db,
//!     "SELECT SAMPLE(id -> sales) UNTIL((SELECT COUNT(*) FROM sales) >= 100) \
//!      SELECT COUNT(*) * _FACTOR FROM sales",
//! )?;
//! ```

pub mod policy;

pub use policy::{TransactionPolicy, CATALOG_SAVEPOINT};

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::SamplingSettings;
use crate::convert::{self, ConversionPlan};
use crate::db::{Database, Rows};
use crate::error::{SemanticError, SsqlResult};
use crate::executor;
use crate::rewrite::{QueryPair, SamplingCompiler};
use crate::sql::dialect::Dialect;
use crate::syntax::{lex, strip_sampling_comments, LexKind};

/// What a statement turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `CREATE TABLE` declaring a `SAMPLEKEY`.
    Conversion,
    /// A query, sampled when it uses `SAMPLE`/`UNTIL`.
    Query,
    /// Sent to the database as written.
    Passthrough,
}

/// Result of [`Engine::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Rows of a query, sampled or not.
    Rows(Rows),
    /// A sampling table was built with these statements.
    Converted { statements: Vec<String> },
    /// A passthrough statement ran.
    Executed { affected: u64 },
}

/// Sampling engine bound to one dialect. Owns the catalog it resolves
/// sample keys against.
#[derive(Debug, Clone)]
pub struct Engine {
    dialect: Dialect,
    settings: SamplingSettings,
    catalog: Catalog,
}

impl Engine {
    pub fn new(dialect: Dialect) -> Self {
        Self::with_settings(dialect, SamplingSettings::default())
    }

    pub fn with_settings(dialect: Dialect, settings: SamplingSettings) -> Self {
        Self {
            dialect,
            settings,
            catalog: Catalog::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn settings(&self) -> &SamplingSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Classify `sql` by its leading words.
    pub fn classify(&self, sql: &str) -> SsqlResult<StatementKind> {
        let lexed = lex(&strip_sampling_comments(sql), self.dialect)?;
        let Some(first) = lexed.first() else {
            return Ok(StatementKind::Passthrough);
        };
        if first.is_word("CREATE") {
            let is_table = lexed.words().take(4).any(|w| w.is_word("TABLE"));
            if is_table && lexed.words().any(|w| w.is_word("SAMPLEKEY")) {
                return Ok(StatementKind::Conversion);
            }
            return Ok(StatementKind::Passthrough);
        }
        if first.is_any_word(&["SELECT", "WITH"]) || first.is(LexKind::LParen) {
            return Ok(StatementKind::Query);
        }
        Ok(StatementKind::Passthrough)
    }

    /// The SQL that would run for `sql`, without running any of it.
    ///
    /// A conversion lists its whole plan; a sampling query lists its
    /// condition and aggregate at the configured explain level. Returns
    /// `None` for statements that pass through.
    pub fn explain<D: Database + ?Sized>(
        &mut self,
        db: &mut D,
        sql: &str,
    ) -> SsqlResult<Option<Vec<String>>> {
        match self.classify(sql)? {
            StatementKind::Conversion => Ok(Some(convert::convert(sql, self.dialect)?.statements())),
            StatementKind::Query if self.settings.enabled => {
                let Some(pair) = self.rewrite_at(db, sql, self.settings.explain_level)? else {
                    return Ok(None);
                };
                let mut statements: Vec<String> = pair.condition_query.into_iter().collect();
                statements.push(pair.aggregate_query);
                Ok(Some(statements))
            }
            _ => Ok(None),
        }
    }

    /// Rewrite a sampling query at one level. `None` when the query does
    /// not sample.
    pub fn rewrite_at<D: Database + ?Sized>(
        &mut self,
        db: &mut D,
        sql: &str,
        level: u32,
    ) -> SsqlResult<Option<QueryPair>> {
        let compiler = self.compiler(sql)?;
        if !compiler.has_sample_clause() {
            return Ok(None);
        }
        self.catalog.load(db)?;
        compiler.rewrite(level, &self.catalog)
    }

    /// Run one statement.
    pub fn execute<D: Database + ?Sized>(&mut self, db: &mut D, sql: &str) -> SsqlResult<Outcome> {
        let kind = self.classify(sql)?;
        debug!(?kind, "dispatching statement");
        match kind {
            StatementKind::Conversion => {
                let plan = convert::convert(sql, self.dialect)?;
                self.run_conversion(db, &plan)?;
                Ok(Outcome::Converted {
                    statements: plan.statements(),
                })
            }
            StatementKind::Query if self.settings.enabled => self.run_query(db, sql),
            StatementKind::Query => Ok(Outcome::Rows(db.query(sql)?)),
            StatementKind::Passthrough => Ok(Outcome::Executed {
                affected: db.execute(sql)?,
            }),
        }
    }

    fn compiler(&self, sql: &str) -> SsqlResult<SamplingCompiler> {
        SamplingCompiler::new(
            sql,
            self.dialect,
            self.settings.num_levels,
            self.settings.inline_view_for(self.dialect),
        )
    }

    fn run_query<D: Database + ?Sized>(&mut self, db: &mut D, sql: &str) -> SsqlResult<Outcome> {
        let compiler = self.compiler(sql)?;
        if !compiler.has_sample_clause() {
            return Ok(Outcome::Rows(db.query(sql)?));
        }
        self.catalog.load(db)?;

        let catalog = &self.catalog;
        let result = executor::search(db, compiler.num_levels(), |level| {
            compiler
                .rewrite(level, catalog)?
                .ok_or_else(|| SemanticError::UntilWithoutSample.into())
        })?;
        info!(
            level = result.pair.level,
            probes = result.probes,
            "stopping condition satisfied"
        );
        Ok(Outcome::Rows(db.query(&result.pair.aggregate_query)?))
    }

    fn run_conversion<D: Database + ?Sized>(
        &mut self,
        db: &mut D,
        plan: &ConversionPlan,
    ) -> SsqlResult<()> {
        info!(table = %plan.table_name, "converting to sampling table");
        db.execute(&plan.staging_create)?;
        let created =
            TransactionPolicy::for_dialect(self.dialect).create_catalog(db, &plan.catalog_create)?;
        debug!(created, "catalog table ready");
        db.execute(&plan.catalog_insert)?;
        db.execute(&plan.migration)?;
        for statement in &plan.post {
            db.execute(statement)?;
        }
        if self.catalog.is_loaded() {
            self.catalog.reload(db)?;
        }
        Ok(())
    }
}
