//! Event and Registration entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::update::SparseUpdate;

/// Stored event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Event fields supplied by the caller on insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

impl NewEvent {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Partial change to an event; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.slug.is_none() && self.description.is_none()
    }

    /// Column assignments for this patch, stamping `updated` when anything changes
    pub fn into_update(self, now: DateTime<Utc>) -> SparseUpdate {
        if self.is_empty() {
            return SparseUpdate::new();
        }

        SparseUpdate::new()
            .set_opt("name", self.name)
            .set_opt("slug", self.slug)
            .set_opt("description", self.description)
            .set("updated", now)
    }
}

/// A participant's registration for an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Registration {
    pub event: i32,
    pub username: String,
    pub comment: Option<String>,
    pub created: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqlValue;
    use crate::update::UpdateStatement;

    #[test]
    fn test_empty_patch_produces_no_update() {
        let update = EventPatch::default().into_update(Utc::now());
        assert!(update.is_empty());
    }

    #[test]
    fn test_patch_stamps_updated() {
        let now = Utc::now();
        let patch = EventPatch {
            description: Some("Outdoor concerts".to_string()),
            ..Default::default()
        };

        let stmt = UpdateStatement::build("events", 3, patch.into_update(now))
            .unwrap()
            .unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE events SET description = $2, updated = $3 WHERE id = $1 RETURNING *"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Int(3),
                SqlValue::Text("Outdoor concerts".to_string()),
                SqlValue::Timestamp(now),
            ]
        );
    }

    #[test]
    fn test_new_event_defaults_description() {
        let event: NewEvent =
            serde_json::from_str(r#"{"name":"Summer Fest","slug":"summer-fest"}"#).unwrap();
        assert_eq!(event, NewEvent::new("Summer Fest", "summer-fest"));
        assert!(event.description.is_empty());
    }
}
