//! Database connection configuration.
//!
//! Supports configuration via environment variables:
//! - `SSQL_DB_URL`: Connection URL, optionally prefixed with `sample:`
//! - `SSQL_DB_DIALECT`: Dialect name (optional, detected from the URL)

use std::env;

use crate::sql::dialect::{helpers, Dialect};

/// Environment variable holding the connection URL.
pub const DB_URL_ENV_VAR: &str = "SSQL_DB_URL";

/// Environment variable overriding the detected dialect.
pub const DB_DIALECT_ENV_VAR: &str = "SSQL_DB_DIALECT";

/// URL schemes the bundled SQLite adapter accepts.
const SQLITE_SCHEMES: &[&str] = &["sqlite://", "sqlite:", "jdbc:sqlite:"];

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported dialect: {0}. Supported: postgres, redshift, sqlite, generic")]
    UnsupportedDialect(String),

    #[error("only SQLite connections can be executed, got '{0}'")]
    NotExecutable(String),

    #[error("dialect {dialect} can't be used over the SQLite connection '{url}'")]
    DialectMismatch { dialect: Dialect, url: String },
}

/// Database connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Connection URL as given.
    pub url: String,
    /// SQL dialect spoken over this connection.
    pub dialect: Dialect,
}

impl ConnectionConfig {
    /// Config for `url` with its dialect detected. A bare file path is a
    /// SQLite database.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let mut dialect = Dialect::detect(&url);
        if dialect == Dialect::Generic && is_bare_path(&url) {
            dialect = Dialect::Sqlite;
        }
        Self { url, dialect }
    }

    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `SSQL_DB_URL`
    ///
    /// Optional:
    /// - `SSQL_DB_DIALECT`: postgres, redshift, sqlite or generic
    pub fn from_env() -> Result<Self, ConnectionError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConnectionError> {
        let url = var(DB_URL_ENV_VAR)
            .ok_or_else(|| ConnectionError::MissingEnvVar(DB_URL_ENV_VAR.to_string()))?;
        let mut config = Self::from_url(url);
        if let Some(name) = var(DB_DIALECT_ENV_VAR) {
            config.dialect = Dialect::from_str(&name)
                .ok_or(ConnectionError::UnsupportedDialect(name))?;
        }
        Ok(config)
    }

    /// Whether the URL was written with the `sample:` prefix.
    pub fn is_sampling_url(&self) -> bool {
        helpers::strip_sampling_prefix(&self.url).len() != self.url.trim().len()
    }

    /// Whether the URL names a database the bundled SQLite adapter can open.
    pub fn is_sqlite(&self) -> bool {
        let url = helpers::strip_sampling_prefix(&self.url);
        helpers::has_url_prefix(url, SQLITE_SCHEMES) || is_bare_path(url)
    }

    /// Check that statements can run over this connection: it must be a
    /// SQLite database spoken to in the SQLite dialect.
    pub fn ensure_executable(&self) -> Result<(), ConnectionError> {
        if !self.is_sqlite() {
            return Err(ConnectionError::NotExecutable(self.url.clone()));
        }
        if self.dialect != Dialect::Sqlite {
            return Err(ConnectionError::DialectMismatch {
                dialect: self.dialect,
                url: self.url.clone(),
            });
        }
        Ok(())
    }

    /// File path for the SQLite adapter: the URL without its `sample:` prefix
    /// and any `sqlite:` scheme.
    pub fn sqlite_path(&self) -> &str {
        let url = helpers::strip_sampling_prefix(&self.url);
        SQLITE_SCHEMES
            .iter()
            .find_map(|scheme| {
                url.get(..scheme.len())
                    .filter(|head| head.eq_ignore_ascii_case(scheme))
                    .map(|_| &url[scheme.len()..])
            })
            .unwrap_or(url)
    }
}

/// A path rather than a URL: no `scheme://` and no JDBC prefix.
fn is_bare_path(url: &str) -> bool {
    let url = helpers::strip_sampling_prefix(url);
    !url.contains("://") && !helpers::has_url_prefix(url, &["jdbc:"])
}
