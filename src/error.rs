//! Error handling module
//!
//! Centralized error types for the data-access layer.

use std::path::PathBuf;
use std::time::Duration;

/// Data-layer Result type
pub type DbResult<T> = Result<T, DbError>;

/// Data-layer error types
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    // Pool / connectivity
    #[error("Connection pool unavailable: {0}")]
    PoolUnavailable(#[source] sqlx::Error),

    // Statement execution
    #[error("Statement failed: {source} (statement: {statement})")]
    Execution {
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Statement timed out after {timeout:?} (statement: {statement})")]
    Timeout { statement: String, timeout: Duration },

    #[error("Row mapping failed: {0}")]
    Mapping(#[source] sqlx::Error),

    // Programming errors
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    // Schema bootstrap
    #[error("Cannot read schema file {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DbError {
    /// Errors the owning process should not try to recover from
    pub fn is_fatal(&self) -> bool {
        matches!(self, DbError::PoolUnavailable(sqlx::Error::PoolClosed))
    }

    /// Check if this error is a pool acquisition/connectivity failure
    pub fn is_pool_unavailable(&self) -> bool {
        matches!(self, DbError::PoolUnavailable(_))
    }

    /// Check if this error signals a caller bug rather than a data-layer failure
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, DbError::ContractViolation(_))
    }

    /// Statement text attached to the error, if any
    pub fn statement(&self) -> Option<&str> {
        match self {
            DbError::Execution { statement, .. } | DbError::Timeout { statement, .. } => {
                Some(statement)
            }
            _ => None,
        }
    }

    /// Database error code (SQLSTATE) for execution failures, e.g. `23505` for unique violations
    pub fn sqlstate(&self) -> Option<String> {
        match self {
            DbError::Execution {
                source: sqlx::Error::Database(db_err),
                ..
            } => db_err.code().map(|c| c.into_owned()),
            _ => None,
        }
    }
}
