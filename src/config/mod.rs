//! Configuration module for ssql.
//!
//! Handles connection configuration, environment variables, and settings.

mod connection;
mod settings;

pub use connection::{ConnectionConfig, ConnectionError, DB_DIALECT_ENV_VAR, DB_URL_ENV_VAR};
pub use settings::{
    expand_env_vars, ConnectionSettings, SamplingSettings, Settings, SettingsError,
    CONFIG_ENV_VAR, LOCAL_CONFIG_FILE,
};
