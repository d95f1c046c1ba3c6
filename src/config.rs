//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default schema creation script
pub const SCHEMA_FILE: &str = "./sql/schema.sql";

/// Default schema drop script
pub const DROP_SCHEMA_FILE: &str = "./sql/drop.sql";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,

    /// Upper bound for a single statement
    pub statement_timeout: Duration,

    /// Schema creation script
    pub schema_file: PathBuf,

    /// Schema drop script
    pub drop_schema_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", "10")?;

        let acquire_timeout =
            Duration::from_secs(parse_var("DATABASE_ACQUIRE_TIMEOUT_SECS", "5")?);

        let statement_timeout =
            Duration::from_secs(parse_var("DATABASE_STATEMENT_TIMEOUT_SECS", "30")?);

        let schema_file = env::var("SCHEMA_FILE")
            .unwrap_or_else(|_| SCHEMA_FILE.to_string())
            .into();

        let drop_schema_file = env::var("DROP_SCHEMA_FILE")
            .unwrap_or_else(|_| DROP_SCHEMA_FILE.to_string())
            .into();

        Ok(Self {
            database_url,
            database_max_connections,
            acquire_timeout,
            statement_timeout,
            schema_file,
            drop_schema_file,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name))
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
