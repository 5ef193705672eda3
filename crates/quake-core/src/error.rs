//! Error types for configuration and the pull/query cycle.
//!
//! [`ConfigError`] covers everything that can be wrong before the first
//! byte goes over the network. [`PipelineError`] aggregates the per-crate
//! errors so the binary has a single type to report.

use std::path::PathBuf;

use quake_catalog::CatalogError;
use quake_db::DbError;

/// Errors raised while loading configuration or resolving a region.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration or regions file from disk.
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        /// The file that could not be read or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse or emit YAML content.
    #[error("failed to parse YAML: {source}")]
    Yaml {
        /// The underlying YAML error.
        #[from]
        source: serde_yml::Error,
    },

    /// A region record is missing a bound, has a non-numeric bound, or its
    /// bounds do not form a valid box.
    #[error("invalid region '{region}': {reason}")]
    InvalidBox {
        /// Name of the offending record (`default` for the default record).
        region: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The regions file does not have a recognizable shape.
    #[error("invalid regions file: {0}")]
    InvalidRegions(String),

    /// A named region was requested that the regions file does not define.
    #[error("unknown region '{0}'")]
    UnknownRegion(String),

    /// No region was named and the regions file defines no default.
    #[error("no region given and no default region defined")]
    NoDefaultRegion,
}

/// The four failure kinds an operator sees at the command boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad configuration, bad region, or an unrepresentable window.
    Configuration,
    /// The catalog could not be reached or answered with an error status.
    UpstreamUnavailable,
    /// The catalog answered with a document of the wrong shape.
    MalformedResponse,
    /// The local store could not be opened, read or written.
    StorageUnavailable,
}

impl ErrorKind {
    /// Stable name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration_error",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::MalformedResponse => "malformed_response",
            Self::StorageUnavailable => "storage_unavailable",
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a pull or query cycle.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Configuration or region resolution failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The catalog request failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The store failed.
    #[error(transparent)]
    Storage(#[from] DbError),
}

impl PipelineError {
    /// Classify this error into one of the operator-facing kinds.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Catalog(CatalogError::WindowOutOfRange { .. }) => {
                ErrorKind::Configuration
            }
            Self::Catalog(CatalogError::UpstreamUnavailable(_)) => ErrorKind::UpstreamUnavailable,
            Self::Catalog(CatalogError::MalformedResponse(_)) => ErrorKind::MalformedResponse,
            Self::Storage(_) => ErrorKind::StorageUnavailable,
        }
    }
}
