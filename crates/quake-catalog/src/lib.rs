//! Upstream earthquake catalog client for the Quake workspace.
//!
//! ```text
//! GeoBox + days --> CatalogFetcher --> Vec<RawEvent> --> normalize --> Vec<EventRecord>
//! ```
//!
//! # Modules
//!
//! - [`fetcher`] -- One bounded HTTP GET against an FDSN event service
//! - [`normalize`] -- `GeoJSON` feature to [`quake_types::EventRecord`] mapping
//! - [`error`] -- Request-level error types

pub mod error;
pub mod fetcher;
pub mod normalize;

// Re-export primary types for convenience.
pub use error::CatalogError;
pub use fetcher::{
    CatalogConfig, CatalogFetcher, DEFAULT_CATALOG_URL, DEFAULT_FORMAT, TimeWindow,
    extract_features,
};
pub use normalize::{SkipReason, normalize, normalize_event};
