//! event_registry - schema bootstrap tool
//!
//! Run with: cargo run -- [check|create-schema|drop-schema|reset]

use std::process::ExitCode;

use event_registry::db::pool;
use event_registry::{schema, Config, QueryGateway};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "event_registry=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Check,
    CreateSchema,
    DropSchema,
    Reset,
}

impl Command {
    fn parse(arg: Option<&str>) -> anyhow::Result<Self> {
        match arg {
            None | Some("check") => Ok(Command::Check),
            Some("create-schema") => Ok(Command::CreateSchema),
            Some("drop-schema") => Ok(Command::DropSchema),
            Some("reset") => Ok(Command::Reset),
            Some(other) => Err(anyhow::anyhow!(
                "Unknown command '{}', expected check, create-schema, drop-schema or reset",
                other
            )),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = Command::parse(args.get(1).map(String::as_str))?;

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");

    // A pool that cannot connect is unrecoverable
    let pool = match pool::connect(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Database connection failed, exiting");
            return Ok(ExitCode::FAILURE);
        }
    };

    let gateway = QueryGateway::new(pool).with_statement_timeout(config.statement_timeout);

    let outcome = run(command, &gateway, &config).await;

    gateway.close().await;
    tracing::info!("Database connections closed");

    match outcome {
        Ok(true) => Ok(ExitCode::SUCCESS),
        Ok(false) => Ok(ExitCode::FAILURE),
        Err(e) if e.is_fatal() => {
            tracing::error!(error = %e, "Database pool failed, exiting");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

async fn run(
    command: Command,
    gateway: &QueryGateway,
    config: &Config,
) -> event_registry::DbResult<bool> {
    match command {
        Command::Check => {
            schema::verify_connection(gateway).await?;
            let complete = schema::check_schema(gateway).await?;
            if complete {
                tracing::info!("Database schema is complete");
            } else {
                tracing::error!("Database schema is not complete. Run create-schema.");
            }
            Ok(complete)
        }
        Command::CreateSchema => {
            schema::create_schema(gateway, &config.schema_file).await?;
            Ok(true)
        }
        Command::DropSchema => {
            schema::drop_schema(gateway, &config.drop_schema_file).await?;
            Ok(true)
        }
        Command::Reset => {
            schema::drop_schema(gateway, &config.drop_schema_file).await?;
            schema::create_schema(gateway, &config.schema_file).await?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse(None).unwrap(), Command::Check);
        assert_eq!(Command::parse(Some("reset")).unwrap(), Command::Reset);
        assert_eq!(
            Command::parse(Some("create-schema")).unwrap(),
            Command::CreateSchema
        );
        assert!(Command::parse(Some("migrate")).is_err());
    }
}
