//! Error types for the data layer.
//!
//! All storage failures surface as [`DbError::StorageUnavailable`], which
//! wraps the underlying [`sqlx`] error: an unopenable file, a permission
//! problem, a full disk and a corrupt database all look the same to callers.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The store could not be opened, read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    /// A stored row does not decode into an event record.
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}
