//! Event Repository
//!
//! Reads and writes events and registrations through the query gateway.

use chrono::Utc;
use sqlx::Row;

use crate::db::QueryGateway;
use crate::error::{DbError, DbResult};
use crate::update::UpdateOutcome;

use super::{Event, EventPatch, NewEvent, Registration};

/// Repository for events and their registrations
#[derive(Debug, Clone)]
pub struct EventRepository {
    gateway: QueryGateway,
}

impl EventRepository {
    /// Create a new EventRepository over a gateway
    pub fn new(gateway: QueryGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &QueryGateway {
        &self.gateway
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// All events, oldest first
    pub async fn list_events(&self) -> DbResult<Vec<Event>> {
        let result = self
            .gateway
            .execute("SELECT * FROM events ORDER BY id", Vec::new())
            .await?;

        Ok(result.map_all())
    }

    pub async fn event_by_slug(&self, slug: &str) -> DbResult<Option<Event>> {
        let result = self
            .gateway
            .execute("SELECT * FROM events WHERE slug = $1", vec![slug.into()])
            .await?;

        result.map_first()
    }

    /// Insert an event, returning it with its generated id and timestamps
    pub async fn insert_event(&self, event: NewEvent) -> DbResult<Event> {
        let NewEvent {
            name,
            slug,
            description,
        } = event;

        let result = self
            .gateway
            .execute(
                r#"
                INSERT INTO events (name, slug, description)
                VALUES ($1, $2, $3)
                RETURNING id, slug, name, description, created, updated
                "#,
                vec![name.into(), slug.into(), description.into()],
            )
            .await?;

        result
            .map_first()?
            .ok_or(DbError::Mapping(sqlx::Error::RowNotFound))
    }

    /// Apply a partial change to event `id`
    ///
    /// Returns `None` when the patch is empty or no event has that id.
    pub async fn update_event(&self, id: i32, patch: EventPatch) -> DbResult<Option<Event>> {
        let update = patch.into_update(Utc::now());

        match self.gateway.conditional_update("events", id, update).await? {
            UpdateOutcome::NothingToDo => Ok(None),
            UpdateOutcome::Updated(result) => result.map_first(),
        }
    }

    /// Delete an event and every registration that references it
    ///
    /// Registrations go first so none is left pointing at a missing event. All
    /// steps share one transaction; any failure rolls the whole delete back.
    pub async fn delete_event_by_slug(&self, slug: &str) -> DbResult<bool> {
        let mut tx = self.gateway.begin().await?;

        let found = tx
            .execute("SELECT id FROM events WHERE slug = $1", vec![slug.into()])
            .await?;

        let id: i32 = match found.first() {
            Some(row) => row.try_get("id").map_err(DbError::Mapping)?,
            None => {
                tx.rollback().await?;
                return Ok(false);
            }
        };

        let registrations = tx
            .execute("DELETE FROM registrations WHERE event = $1", vec![id.into()])
            .await?;

        let deleted = tx
            .execute("DELETE FROM events WHERE slug = $1", vec![slug.into()])
            .await?;

        if deleted.rows_affected() != 1 {
            tracing::warn!(
                slug,
                rows = deleted.rows_affected(),
                "Event delete did not remove exactly one row, rolling back"
            );
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;

        tracing::info!(
            slug,
            event_id = id,
            registrations = registrations.rows_affected(),
            "Event deleted"
        );

        Ok(true)
    }

    // =========================================================================
    // Registrations
    // =========================================================================

    pub async fn list_registrations(&self, event_id: i32) -> DbResult<Vec<Registration>> {
        let result = self
            .gateway
            .execute(
                "SELECT * FROM registrations WHERE event = $1 ORDER BY created, username",
                vec![event_id.into()],
            )
            .await?;

        Ok(result.map_all())
    }

    /// Register `username` for an existing event
    pub async fn register(
        &self,
        event_id: i32,
        username: &str,
        comment: Option<&str>,
    ) -> DbResult<Registration> {
        let result = self
            .gateway
            .execute(
                r#"
                INSERT INTO registrations (event, username, comment)
                VALUES ($1, $2, $3)
                RETURNING event, username, comment, created
                "#,
                vec![event_id.into(), username.into(), comment.into()],
            )
            .await?;

        result
            .map_first()?
            .ok_or(DbError::Mapping(sqlx::Error::RowNotFound))
    }

    /// Remove one registration; `false` if there was none to remove
    pub async fn remove_registration(&self, event_id: i32, username: &str) -> DbResult<bool> {
        let result = self
            .gateway
            .execute(
                "DELETE FROM registrations WHERE event = $1 AND username = $2",
                vec![event_id.into(), username.into()],
            )
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
