//! Connection Pool Manager
//!
//! Builds the process-wide `PgPool` from configuration. The pool is an explicit
//! value handed to whoever needs it; there is no global handle.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::Config;

/// Create the pool and open the first connection
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = options(config).connect_with(connect_options(config)?).await?;

    tracing::info!(
        max_connections = config.database_max_connections,
        statement_timeout_ms = config.statement_timeout.as_millis() as u64,
        "Database pool ready"
    );

    Ok(pool)
}

/// Create the pool without connecting; the first acquire opens a connection
pub fn connect_lazy(config: &Config) -> Result<PgPool, sqlx::Error> {
    Ok(options(config).connect_lazy_with(connect_options(config)?))
}

/// Connection settings from the URL, with the server cancelling any statement
/// that outlives `statement_timeout` so the connection is free again afterwards
pub fn connect_options(config: &Config) -> Result<PgConnectOptions, sqlx::Error> {
    let options: PgConnectOptions = config.database_url.parse()?;
    Ok(options.options([(
        "statement_timeout",
        config.statement_timeout.as_millis().to_string(),
    )]))
}

fn options(config: &Config) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.acquire_timeout)
}
