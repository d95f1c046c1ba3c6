//! Events module
//!
//! Events, their registrations and the repository that persists both.

mod model;
mod repository;

pub use model::{Event, EventPatch, NewEvent, Registration};
pub use repository::EventRepository;
