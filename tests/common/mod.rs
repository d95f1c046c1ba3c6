//! Common test utilities

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use event_registry::config::{DROP_SCHEMA_FILE, SCHEMA_FILE};
use event_registry::db::pool;
use event_registry::{schema, Config, QueryGateway};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;

static SCHEMA: OnceCell<()> = OnceCell::const_new();

/// Setup test database - ensure the schema exists and return a gateway
pub async fn setup_test_db() -> QueryGateway {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    let gateway = QueryGateway::new(pool);

    SCHEMA
        .get_or_init(|| async {
            let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(SCHEMA_FILE);
            schema::create_schema(&gateway, path)
                .await
                .expect("Failed to create schema");
        })
        .await;

    gateway
}

/// Gateway over a one-connection pool with server and client statement timeouts
#[allow(dead_code)]
pub async fn single_connection_gateway(statement_timeout: Duration) -> QueryGateway {
    dotenvy::dotenv().ok();
    let config = Config {
        database_url: std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set for tests"),
        database_max_connections: 1,
        acquire_timeout: Duration::from_secs(5),
        statement_timeout,
        schema_file: SCHEMA_FILE.into(),
        drop_schema_file: DROP_SCHEMA_FILE.into(),
    };

    let pool = pool::connect(&config)
        .await
        .expect("Failed to connect to DB");
    QueryGateway::new(pool).with_statement_timeout(statement_timeout)
}

/// Slug that no other test run will collide with
pub fn unique_slug(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}
