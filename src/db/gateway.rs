//! Query Gateway
//!
//! The single path by which statements reach the database. Each call acquires a
//! connection, runs one parameterized statement and hands the connection back
//! to the pool on every exit path.

use std::time::Duration;

use futures_util::TryStreamExt;
use sqlx::pool::PoolConnection;
use sqlx::{Either, Executor, PgConnection, PgPool, Postgres, Transaction};

use crate::error::{DbError, DbResult};

use super::{QueryResult, SqlValue};

/// Applied when no statement timeout is configured
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra time the client waits past the server-side `statement_timeout`
const CLIENT_GRACE: Duration = Duration::from_secs(1);

/// SQLSTATE `query_canceled`, raised when the server hits `statement_timeout`
const QUERY_CANCELED: &str = "57014";

/// Connection-pooled statement executor
#[derive(Debug, Clone)]
pub struct QueryGateway {
    pool: PgPool,
    statement_timeout: Duration,
}

impl QueryGateway {
    /// Create a new QueryGateway over a database pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
        }
    }

    /// Client-side deadline per statement
    ///
    /// The server enforces the same limit when the pool was built by
    /// [`super::pool::connect`]; this deadline fires only if the server does not.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Execute one statement with positional parameters (`$1`, `$2`, ...)
    ///
    /// An `Err` means there is no result at all; an empty `QueryResult` is a
    /// successful statement that matched nothing.
    pub async fn execute(&self, statement: &str, params: Vec<SqlValue>) -> DbResult<QueryResult> {
        let mut conn = self.acquire().await?;
        run(&mut conn, statement, params, self.statement_timeout).await
    }

    /// Execute a parameterless script verbatim, possibly holding several statements
    pub async fn execute_script(&self, script: &str) -> DbResult<u64> {
        let mut conn = self.acquire().await?;

        tracing::debug!(bytes = script.len(), "Executing script");

        let deadline = self.statement_timeout + CLIENT_GRACE;
        match tokio::time::timeout(deadline, (&mut *conn).execute(script)).await {
            Ok(Ok(done)) => Ok(done.rows_affected()),
            Ok(Err(source)) if is_query_canceled(&source) => {
                Err(timed_out(script, self.statement_timeout))
            }
            Ok(Err(source)) => {
                tracing::warn!(error = %source, "Script failed");
                Err(DbError::Execution {
                    statement: script.to_string(),
                    source,
                })
            }
            Err(_) => Err(timed_out(script, self.statement_timeout)),
        }
    }

    /// Start a transaction on a dedicated connection
    pub async fn begin(&self) -> DbResult<GatewayTransaction> {
        let tx = self.pool.begin().await.map_err(pool_unavailable)?;
        Ok(GatewayTransaction {
            tx,
            statement_timeout: self.statement_timeout,
        })
    }

    /// Drain the pool; later calls fail with `PoolUnavailable`
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn acquire(&self) -> DbResult<PoolConnection<Postgres>> {
        self.pool.acquire().await.map_err(pool_unavailable)
    }
}

/// Statements sharing one transaction
///
/// Dropping the handle without calling [`GatewayTransaction::commit`] rolls back.
pub struct GatewayTransaction {
    tx: Transaction<'static, Postgres>,
    statement_timeout: Duration,
}

impl GatewayTransaction {
    pub async fn execute(
        &mut self,
        statement: &str,
        params: Vec<SqlValue>,
    ) -> DbResult<QueryResult> {
        run(&mut self.tx, statement, params, self.statement_timeout).await
    }

    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await.map_err(|source| DbError::Execution {
            statement: "COMMIT".to_string(),
            source,
        })
    }

    pub async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await.map_err(|source| DbError::Execution {
            statement: "ROLLBACK".to_string(),
            source,
        })
    }
}

async fn run(
    conn: &mut PgConnection,
    statement: &str,
    params: Vec<SqlValue>,
    timeout: Duration,
) -> DbResult<QueryResult> {
    tracing::debug!(statement, params = params.len(), "Executing statement");

    let query = params
        .into_iter()
        .fold(sqlx::query(statement), |query, value| value.bind_to(query));

    let collect = async {
        let mut rows = Vec::new();
        let mut rows_affected = 0;

        let mut stream = query.fetch_many(conn);
        while let Some(step) = stream.try_next().await? {
            match step {
                Either::Left(done) => rows_affected += done.rows_affected(),
                Either::Right(row) => rows.push(row),
            }
        }

        Ok::<_, sqlx::Error>(QueryResult::new(rows, rows_affected))
    };

    match tokio::time::timeout(timeout + CLIENT_GRACE, collect).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(source)) if is_query_canceled(&source) => Err(timed_out(statement, timeout)),
        Ok(Err(source)) => {
            tracing::warn!(error = %source, statement, "Statement failed");
            Err(DbError::Execution {
                statement: statement.to_string(),
                source,
            })
        }
        Err(_) => Err(timed_out(statement, timeout)),
    }
}

fn pool_unavailable(e: sqlx::Error) -> DbError {
    tracing::error!(error = %e, "Unable to get connection from pool");
    DbError::PoolUnavailable(e)
}

fn is_query_canceled(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(QUERY_CANCELED),
        _ => false,
    }
}

fn timed_out(statement: &str, timeout: Duration) -> DbError {
    tracing::warn!(
        statement,
        timeout_ms = timeout.as_millis() as u64,
        "Statement timed out"
    );
    DbError::Timeout {
        statement: statement.to_string(),
        timeout,
    }
}
