//! Configuration, region lookup and pull/query orchestration.
//!
//! This crate ties the catalog client and the store together into the two
//! cycles the operator runs: a full pull (fetch, store, query) and a
//! query-only inspection.
//!
//! # Modules
//!
//! - [`config`] -- `quake-config.yaml` loading with environment overrides
//! - [`regions`] -- Regions file parsing and the [`BoxProvider`] seam
//! - [`pipeline`] -- The pull and query cycles
//! - [`error`] -- Configuration and pipeline error types

pub mod config;
pub mod error;
pub mod pipeline;
pub mod regions;

// Re-export primary types for convenience.
pub use config::{
    DEFAULT_CONFIG_PATH, DEFAULT_REGIONS_PATH, LoggingConfig, QuakeConfig, RegionsConfig,
    StorageConfig, UpstreamConfig,
};
pub use error::{ConfigError, ErrorKind, PipelineError};
pub use pipeline::{IngestReport, Pipeline, PullReport};
pub use regions::{BoxProvider, NamedBox, RegionFile, RegionTable};
