//! How the catalog table is created inside a conversion.
//!
//! Every conversion issues `CREATE TABLE _SAMPLE_KEY_DEFS`, which fails once
//! the table exists. That failure is expected and must not poison an open
//! transaction, so each dialect guards the statement its own way.

use tracing::{debug, warn};

use crate::db::{Database, DbError};
use crate::error::SsqlResult;
use crate::sql::dialect::{Dialect, SqlDialect};

/// Savepoint guarding the catalog DDL.
pub const CATALOG_SAVEPOINT: &str = "ssql_catalog";

/// Strategy for running the catalog `CREATE TABLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPolicy {
    /// Wrap the statement in a savepoint and roll back to it on a duplicate.
    Savepoint,
    /// Commit pending work first and again after a duplicate.
    CommitFirst,
    /// Run the statement and ignore a duplicate.
    Direct,
}

impl TransactionPolicy {
    pub fn for_dialect(dialect: Dialect) -> Self {
        if dialect.supports_savepoints() {
            TransactionPolicy::Savepoint
        } else if dialect.commits_before_catalog_ddl() {
            TransactionPolicy::CommitFirst
        } else {
            TransactionPolicy::Direct
        }
    }

    /// Run the catalog `CREATE TABLE`. Returns whether the table was
    /// created; `false` means it already existed.
    pub fn create_catalog<D: Database + ?Sized>(self, db: &mut D, sql: &str) -> SsqlResult<bool> {
        if db.is_autocommit() {
            return Self::ignore_duplicate(db.execute(sql));
        }
        match self {
            TransactionPolicy::Direct => Self::ignore_duplicate(db.execute(sql)),
            TransactionPolicy::CommitFirst => {
                db.commit()?;
                match db.execute(sql) {
                    Ok(_) => Ok(true),
                    Err(err) if err.is_duplicate_object() => {
                        db.commit()?;
                        warn!(error = %err, "catalog table already exists");
                        Ok(false)
                    }
                    Err(err) => Err(err.into()),
                }
            }
            TransactionPolicy::Savepoint => {
                db.savepoint(CATALOG_SAVEPOINT)?;
                let outcome = match db.execute(sql) {
                    Ok(_) => Ok(true),
                    Err(err) if err.is_duplicate_object() => db
                        .rollback_to_savepoint(CATALOG_SAVEPOINT)
                        .map(|()| {
                            warn!(error = %err, "catalog table already exists");
                            false
                        })
                        .map_err(Into::into),
                    Err(err) => Err(err.into()),
                };
                if let Err(err) = db.release_savepoint(CATALOG_SAVEPOINT) {
                    debug!(error = %err, "ignoring failed savepoint release");
                }
                outcome
            }
        }
    }

    fn ignore_duplicate(result: Result<u64, DbError>) -> SsqlResult<bool> {
        match result {
            Ok(_) => Ok(true),
            Err(err) if err.is_duplicate_object() => {
                warn!(error = %err, "catalog table already exists");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}
