//! Data layer for the Quake catalog workspace (`SQLite`).
//!
//! # Architecture
//!
//! ```text
//! normalize --> EventStore::upsert_many --> earthquakes (unique 6-tuple)
//!                                               |
//! operator  <-- EventStore::query  <------------+
//! ```
//!
//! # Modules
//!
//! - [`sqlite`] -- Connection configuration (one connection per operation)
//! - [`event_store`] -- Schema, deduplicating upsert and ranked retrieval
//! - [`error`] -- Shared error types

pub mod error;
pub mod event_store;
pub mod sqlite;

// Re-export primary types for convenience.
pub use error::DbError;
pub use event_store::{EventRow, EventStore, recency_cutoff};
pub use sqlite::{DEFAULT_DB_PATH, SqliteConfig};
