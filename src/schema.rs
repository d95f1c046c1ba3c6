//! Schema bootstrap
//!
//! Loads static SQL scripts and runs them verbatim. Paths are parameters so
//! tests can point at their own files.

use std::path::Path;

use crate::db::QueryGateway;
use crate::error::{DbError, DbResult};

/// Tables the repository layer relies on
const REQUIRED_TABLES: [&str; 2] = ["events", "registrations"];

/// Run the schema creation script at `path`
pub async fn create_schema(gateway: &QueryGateway, path: impl AsRef<Path>) -> DbResult<()> {
    run_file(gateway, path.as_ref()).await?;
    tracing::info!(path = %path.as_ref().display(), "Schema created");
    Ok(())
}

/// Run the schema drop script at `path`
pub async fn drop_schema(gateway: &QueryGateway, path: impl AsRef<Path>) -> DbResult<()> {
    run_file(gateway, path.as_ref()).await?;
    tracing::info!(path = %path.as_ref().display(), "Schema dropped");
    Ok(())
}

async fn run_file(gateway: &QueryGateway, path: &Path) -> DbResult<()> {
    let script = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DbError::Schema {
            path: path.to_path_buf(),
            source,
        })?;

    gateway.execute_script(&script).await?;
    Ok(())
}

/// Simple connectivity check
pub async fn verify_connection(gateway: &QueryGateway) -> DbResult<()> {
    gateway.execute("SELECT 1", Vec::new()).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(gateway: &QueryGateway) -> DbResult<bool> {
    for table in REQUIRED_TABLES {
        let result = gateway
            .execute(
                r#"
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
                "#,
                vec![table.into()],
            )
            .await?;

        if result.is_empty() {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DROP_SCHEMA_FILE, SCHEMA_FILE};

    #[test]
    fn test_bundled_scripts_cover_required_tables() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let create = std::fs::read_to_string(root.join(SCHEMA_FILE)).unwrap();
        let drop = std::fs::read_to_string(root.join(DROP_SCHEMA_FILE)).unwrap();

        for table in REQUIRED_TABLES {
            assert!(create.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table)));
            assert!(drop.contains(&format!("DROP TABLE IF EXISTS {}", table)));
        }
    }

    #[tokio::test]
    async fn test_missing_schema_file_is_reported() {
        let config = crate::Config {
            database_url: "postgres://localhost/unused".to_string(),
            database_max_connections: 1,
            acquire_timeout: std::time::Duration::from_millis(100),
            statement_timeout: std::time::Duration::from_secs(1),
            schema_file: "missing.sql".into(),
            drop_schema_file: "missing.sql".into(),
        };
        let gateway = QueryGateway::new(crate::db::pool::connect_lazy(&config).unwrap());

        let err = create_schema(&gateway, "./sql/does_not_exist.sql")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Schema { .. }));
    }
}
