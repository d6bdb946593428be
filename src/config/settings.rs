//! TOML-based configuration for ssql.
//!
//! Supports a config file (ssql.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [sampling]
//! enabled = true
//! num_levels = 32
//! inline_view = true     # omit to let the dialect decide
//! explain_level = 4
//!
//! [connections.warehouse]
//! url = "sample:jdbc:redshift://${RS_HOST}:5439/dev"
//!
//! [connections.local]
//! url = "./data/sales.db"
//! dialect = "generic"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::connection::ConnectionConfig;
use crate::sampling::MAX_LEVELS;
use crate::sql::dialect::{Dialect, SqlDialect};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SSQL_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "ssql.toml";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Sampling engine behavior.
    pub sampling: SamplingSettings,

    /// Named database connections.
    pub connections: HashMap<String, ConnectionSettings>,
}

/// Sampling engine settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingSettings {
    /// When false, sampling SELECTs pass through untouched. Conversions
    /// still run.
    pub enabled: bool,

    /// Levels searched by the executor, `1..=32`.
    pub num_levels: u32,

    /// Force inline-view (`true`) or CTE (`false`) emission. Unset means
    /// the dialect's preference.
    pub inline_view: Option<bool>,

    /// Level used by `explain` for sampling queries.
    pub explain_level: u32,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            num_levels: MAX_LEVELS,
            inline_view: None,
            explain_level: 4,
        }
    }
}

impl SamplingSettings {
    /// Check the level bounds.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=MAX_LEVELS).contains(&self.num_levels) {
            return Err(SettingsError::InvalidConfig(format!(
                "num_levels must be within 1..={MAX_LEVELS}, got {}",
                self.num_levels
            )));
        }
        if self.explain_level >= self.num_levels {
            return Err(SettingsError::InvalidConfig(format!(
                "explain_level {} must be below num_levels {}",
                self.explain_level, self.num_levels
            )));
        }
        Ok(())
    }

    /// Emission mode for `dialect`.
    pub fn inline_view_for(&self, dialect: Dialect) -> bool {
        self.inline_view
            .unwrap_or_else(|| dialect.prefers_inline_view())
    }
}

/// Connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Connection URL (supports ${ENV_VAR} expansion).
    pub url: String,

    /// Dialect name; detected from the URL when omitted.
    #[serde(default)]
    pub dialect: Option<String>,
}

impl ConnectionSettings {
    /// Get the dialect, explicit or detected.
    pub fn dialect(&self) -> Result<Dialect, SettingsError> {
        match &self.dialect {
            Some(name) => Dialect::from_str(name)
                .ok_or_else(|| SettingsError::UnsupportedDialect(name.clone())),
            None => Ok(ConnectionConfig::from_url(self.url.as_str()).dialect),
        }
    }

    /// Get the URL with environment variables expanded.
    pub fn resolved_url(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.url)
    }

    /// Resolve into a ready-to-use connection config.
    pub fn to_config(&self) -> Result<ConnectionConfig, SettingsError> {
        let url = self.resolved_url()?;
        Ok(ConnectionConfig {
            dialect: self.dialect()?,
            url,
        })
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.sampling.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SSQL_CONFIG`
    /// 2. `./ssql.toml`
    /// 3. `~/.config/ssql/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ssql").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    /// Get the default connection (the one named "default", else any).
    pub fn default_connection(&self) -> Option<(&str, &ConnectionSettings)> {
        if let Some(conn) = self.connections.get("default") {
            return Some(("default", conn));
        }
        self.connections.iter().next().map(|(k, v)| (k.as_str(), v))
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };
        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
