//! Query Result
//!
//! Transient wrapper around the rows and affected-row count of one statement.

use sqlx::postgres::PgRow;
use sqlx::FromRow;

use crate::error::{DbError, DbResult};

/// Rows returned by a statement plus the number of rows it affected
#[derive(Default)]
pub struct QueryResult {
    rows: Vec<PgRow>,
    rows_affected: u64,
}

impl std::fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResult")
            .field("rows", &self.rows.len())
            .field("rows_affected", &self.rows_affected)
            .finish()
    }
}

impl QueryResult {
    pub(crate) fn new(rows: Vec<PgRow>, rows_affected: u64) -> Self {
        Self {
            rows,
            rows_affected,
        }
    }

    pub fn rows(&self) -> &[PgRow] {
        &self.rows
    }

    pub fn first(&self) -> Option<&PgRow> {
        self.rows.first()
    }

    /// Rows touched by INSERT/UPDATE/DELETE, or returned by SELECT
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Map the first row, if any
    pub fn map_first<T>(&self) -> DbResult<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        self.first()
            .map(|row| T::from_row(row).map_err(DbError::Mapping))
            .transpose()
    }

    /// Map every row, skipping (and logging) rows that do not fit `T`
    pub fn map_all<T>(&self) -> Vec<T>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        self.rows
            .iter()
            .filter_map(|row| match T::from_row(row) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping row that does not map to entity");
                    None
                }
            })
            .collect()
    }
}
