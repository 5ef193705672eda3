//! Shared type definitions for the Quake catalog workspace.
//!
//! Every crate downstream (catalog client, store, pipeline, CLI) speaks in
//! these types, so they are kept free of I/O.
//!
//! # Modules
//!
//! - [`geo`] -- Validated latitude/longitude boxes
//! - [`record`] -- Raw catalog payloads, the canonical event record, query parameters

pub mod geo;
pub mod record;

// Re-export all public types at crate root for convenience.
pub use geo::{GeoBox, GeoBoxError};
pub use record::{DATE_FORMAT, EventRecord, QueryParams, RawEvent, TIME_FORMAT};
