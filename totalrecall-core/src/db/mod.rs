//! Database layer for totalrecall
//!
//! Read-only access to a copied Recall database:
//! - The fixed `WindowCapture` query
//! - Row decoding into capture events

pub mod events;
pub mod schema;

pub use events::{EventStore, QueryOptions};
