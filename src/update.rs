//! Conditional Update Builder
//!
//! Builds one parameterized `UPDATE ... RETURNING *` touching only the fields
//! that are present. Any table whose integer primary key is named `id` can use it.

use crate::db::{QueryGateway, QueryResult, SqlValue};
use crate::error::{DbError, DbResult};

/// Ordered set of field assignments for a single row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseUpdate {
    fields: Vec<(String, Assignment)>,
}

#[derive(Debug, Clone, PartialEq)]
enum Assignment {
    Bind(SqlValue),
    // Written as a literal so it fits any column type
    Null,
}

impl SparseUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` to `field`; a null value leaves the field out
    pub fn set(mut self, field: &str, value: impl Into<SqlValue>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.fields.push((field.to_string(), Assignment::Bind(value)));
        }
        self
    }

    /// Explicitly clear `field` to NULL
    pub fn set_null(mut self, field: &str) -> Self {
        self.fields.push((field.to_string(), Assignment::Null));
        self
    }

    /// Assign `value` to `field` only when it is present
    pub fn set_opt<V: Into<SqlValue>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(field, v),
            None => self,
        }
    }

    /// Build from parallel arrays of optional field names and optional values
    ///
    /// Fields and values are filtered independently, keeping their relative
    /// order. If the surviving counts differ the caller paired them wrongly.
    pub fn from_columns(fields: &[Option<&str>], values: Vec<Option<SqlValue>>) -> DbResult<Self> {
        let fields: Vec<&str> = fields.iter().flatten().copied().collect();
        let values: Vec<SqlValue> = values
            .into_iter()
            .flatten()
            .filter(|v| !v.is_null())
            .collect();

        if fields.len() != values.len() {
            return Err(DbError::ContractViolation(format!(
                "fields and values must be of equal length ({} fields, {} values)",
                fields.len(),
                values.len()
            )));
        }

        Ok(Self {
            fields: fields
                .into_iter()
                .map(str::to_string)
                .zip(values.into_iter().map(Assignment::Bind))
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }
}

/// A ready-to-run UPDATE statement and its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl UpdateStatement {
    /// Build the statement, or `None` when there is nothing to update
    ///
    /// The row id is always `$1`; bound values follow as `$2..` in field order.
    pub fn build(table: &str, id: i32, update: SparseUpdate) -> DbResult<Option<Self>> {
        if update.is_empty() {
            return Ok(None);
        }

        ensure_identifier(table)?;
        for field in update.field_names() {
            ensure_identifier(field)?;
        }

        let mut params = Vec::with_capacity(update.len() + 1);
        params.push(SqlValue::Int(id));

        let mut assignments = Vec::with_capacity(update.len());
        for (name, assignment) in update.fields {
            match assignment {
                Assignment::Bind(value) => {
                    params.push(value);
                    assignments.push(format!("{} = ${}", name, params.len()));
                }
                Assignment::Null => assignments.push(format!("{} = NULL", name)),
            }
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE id = $1 RETURNING *",
            table,
            assignments.join(", ")
        );

        Ok(Some(Self { sql, params }))
    }
}

/// Result of a conditional update
#[derive(Debug)]
pub enum UpdateOutcome {
    /// No fields were present; no statement was issued
    NothingToDo,
    /// Statement ran; rows holds the updated row (empty if `id` matched nothing)
    Updated(QueryResult),
}

impl UpdateOutcome {
    pub fn is_nothing_to_do(&self) -> bool {
        matches!(self, UpdateOutcome::NothingToDo)
    }

    pub fn into_result(self) -> Option<QueryResult> {
        match self {
            UpdateOutcome::NothingToDo => None,
            UpdateOutcome::Updated(result) => Some(result),
        }
    }
}

impl QueryGateway {
    /// Update only the fields present in `update` on row `id` of `table`
    pub async fn conditional_update(
        &self,
        table: &str,
        id: i32,
        update: SparseUpdate,
    ) -> DbResult<UpdateOutcome> {
        match UpdateStatement::build(table, id, update)? {
            None => {
                tracing::debug!(table, id, "Conditional update has no fields, skipping");
                Ok(UpdateOutcome::NothingToDo)
            }
            Some(stmt) => {
                let result = self.execute(&stmt.sql, stmt.params).await?;
                Ok(UpdateOutcome::Updated(result))
            }
        }
    }
}

fn ensure_identifier(ident: &str) -> DbResult<()> {
    if is_valid_identifier(ident) {
        Ok(())
    } else {
        Err(DbError::ContractViolation(format!(
            "invalid SQL identifier: {:?}",
            ident
        )))
    }
}

/// `name` or `schema.name`, each part `[A-Za-z_][A-Za-z0-9_]*`
fn is_valid_identifier(ident: &str) -> bool {
    let parts: Vec<&str> = ident.split('.').collect();
    parts.len() <= 2 && parts.iter().all(|part| is_valid_segment(part))
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_skips_missing_fields() {
        let update = SparseUpdate::from_columns(
            &[Some("name"), None, Some("description")],
            vec![Some("New Name".into()), None, Some("New Desc".into())],
        )
        .unwrap();

        let stmt = UpdateStatement::build("events", 7, update).unwrap().unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE events SET name = $2, description = $3 WHERE id = $1 RETURNING *"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Int(7),
                SqlValue::Text("New Name".to_string()),
                SqlValue::Text("New Desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_build_keeps_field_order() {
        let update = SparseUpdate::new()
            .set("slug", "b")
            .set_opt("name", None::<&str>)
            .set("description", "d")
            .set_opt("name", Some("n"));

        let stmt = UpdateStatement::build("events", 1, update).unwrap().unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE events SET slug = $2, description = $3, name = $4 WHERE id = $1 RETURNING *"
        );
        assert_eq!(stmt.params[0], SqlValue::Int(1));
        assert_eq!(stmt.params[3], SqlValue::Text("n".to_string()));
    }

    #[test]
    fn test_empty_update_is_noop() {
        assert!(UpdateStatement::build("events", 1, SparseUpdate::new())
            .unwrap()
            .is_none());

        let update = SparseUpdate::from_columns(&[None, None], vec![None, None]).unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn test_mismatched_columns_violate_contract() {
        let err = SparseUpdate::from_columns(
            &[Some("name"), Some("description")],
            vec![Some("only one".into()), None],
        )
        .unwrap_err();
        assert!(err.is_contract_violation());

        // Fields and values are filtered independently, so shifted gaps still pair up
        let update = SparseUpdate::from_columns(
            &[Some("name"), None],
            vec![None, Some("late".into())],
        )
        .unwrap();
        assert_eq!(update.field_names().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_null_values_are_left_out() {
        let now: Option<chrono::DateTime<chrono::Utc>> = None;
        let update = SparseUpdate::new()
            .set("updated", now)
            .set("name", SqlValue::Null)
            .set("description", None::<String>);

        assert!(update.is_empty());
        assert!(UpdateStatement::build("events", 1, update).unwrap().is_none());
    }

    #[test]
    fn test_set_null_writes_literal() {
        let update = SparseUpdate::new()
            .set("name", "n")
            .set_null("comment")
            .set("description", "d");

        let stmt = UpdateStatement::build("registrations", 4, update).unwrap().unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE registrations SET name = $2, comment = NULL, description = $3 WHERE id = $1 RETURNING *"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Int(4),
                SqlValue::Text("n".to_string()),
                SqlValue::Text("d".to_string()),
            ]
        );
    }

    #[test]
    fn test_explicit_null_values_are_dropped() {
        let err = SparseUpdate::from_columns(&[Some("name")], vec![Some(SqlValue::Null)])
            .unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        let update = SparseUpdate::new().set("name = 'x'; --", "v");
        let err = UpdateStatement::build("events", 1, update).unwrap_err();
        assert!(err.is_contract_violation());

        let update = SparseUpdate::new().set("name", "v");
        assert!(UpdateStatement::build("events; DROP TABLE events", 1, update.clone()).is_err());
        assert!(UpdateStatement::build("public.events", 1, update).is_ok());
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_valid_identifier("events"));
        assert!(is_valid_identifier("_tmp1"));
        assert!(is_valid_identifier("public.events"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1events"));
        assert!(!is_valid_identifier("a.b.c"));
        assert!(!is_valid_identifier("name\""));
    }
}
