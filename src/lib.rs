//! event_registry Library
//!
//! Data-access layer for events and their registrations. All SQL goes through
//! [`db::QueryGateway`].

pub mod config;
pub mod db;
pub mod events;
pub mod schema;
pub mod update;

mod error;

pub use config::Config;
pub use db::{QueryGateway, QueryResult, SqlValue};
pub use error::{DbError, DbResult};
pub use events::{Event, EventPatch, EventRepository, NewEvent, Registration};
pub use update::{SparseUpdate, UpdateOutcome, UpdateStatement};
