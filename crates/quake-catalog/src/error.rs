//! Error types for the catalog client.
//!
//! Only whole-request failures surface here. A single malformed event inside
//! an otherwise valid response is dropped by the normalizer, never raised.

/// Errors that can occur while querying the upstream catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The request could not be completed: connection failure, timeout, or a
    /// non-success HTTP status.
    #[error("catalog unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The catalog answered, but the body is not the expected document.
    #[error("malformed catalog response: {0}")]
    MalformedResponse(String),

    /// The requested look-back window cannot be represented as a timestamp.
    #[error("time window of {days} days is out of range")]
    WindowOutOfRange {
        /// The rejected window length.
        days: u32,
    },
}
