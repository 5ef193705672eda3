//! Pull and query cycles.
//!
//! ```text
//! pull:  BoxProvider --> CatalogFetcher --> normalize --> EventStore::upsert_many --> EventStore::query
//! query:                                                                           EventStore::query
//! ```
//!
//! Each step runs to completion before the next starts, and the first
//! failure aborts the cycle. Region resolution happens before any network
//! activity, so a broken regions file never costs a request.

use quake_catalog::{CatalogFetcher, normalize};
use quake_db::EventStore;
use quake_types::{EventRecord, QueryParams};
use tracing::info;

use crate::config::QuakeConfig;
use crate::error::PipelineError;
use crate::regions::{BoxProvider, NamedBox, RegionFile};

/// Outcome of the write half of a pull cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    /// The region that was queried.
    pub region: NamedBox,
    /// Raw events returned by the catalog.
    pub fetched: usize,
    /// Events that survived normalization.
    pub normalized: usize,
    /// Rows newly written to the store.
    pub inserted: u64,
}

/// Outcome of a full pull cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PullReport {
    /// What was fetched and stored.
    pub ingest: IngestReport,
    /// Ranked query results after ingestion.
    pub results: Vec<EventRecord>,
}

/// The fetch-normalize-store-query pipeline.
pub struct Pipeline<P> {
    provider: P,
    fetcher: CatalogFetcher,
    store: EventStore,
}

impl Pipeline<RegionFile> {
    /// Build a pipeline from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Catalog`] if the HTTP client cannot be built.
    pub fn from_config(config: &QuakeConfig) -> Result<Self, PipelineError> {
        let provider = RegionFile::new(config.regions.path.clone())
            .with_builtin_fallback(config.regions.fallback_to_builtin);
        let fetcher = CatalogFetcher::new(&config.catalog.to_catalog_config())?;
        let store = EventStore::new(config.storage.to_sqlite_config());
        Ok(Self::new(provider, fetcher, store))
    }
}

impl<P: BoxProvider> Pipeline<P> {
    /// Assemble a pipeline from its parts.
    pub const fn new(provider: P, fetcher: CatalogFetcher, store: EventStore) -> Self {
        Self {
            provider,
            fetcher,
            store,
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &EventStore {
        &self.store
    }

    /// Fetch the last `time_window_days` days for `region` and store them.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the region cannot be resolved
    /// (before any request is made), [`PipelineError::Catalog`] if the fetch
    /// fails, and [`PipelineError::Storage`] if the upsert fails.
    pub async fn ingest(
        &self,
        region: Option<&str>,
        time_window_days: u32,
    ) -> Result<IngestReport, PipelineError> {
        let region = self.provider.resolve(region)?;
        info!(%region, time_window_days, "Starting catalog pull");

        let raw_events = self.fetcher.fetch(time_window_days, &region.geo_box).await?;
        let records = normalize(&raw_events);
        let inserted = self.store.upsert_many(&records).await?;

        let report = IngestReport {
            region,
            fetched: raw_events.len(),
            normalized: records.len(),
            inserted,
        };
        info!(
            region = %report.region,
            fetched = report.fetched,
            normalized = report.normalized,
            inserted = report.inserted,
            "Catalog pull stored"
        );
        Ok(report)
    }

    /// Full cycle: ingest the query's time window for `region`, then run the
    /// query against the store.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::ingest`] and [`Pipeline::query`].
    pub async fn pull(
        &self,
        region: Option<&str>,
        params: &QueryParams,
    ) -> Result<PullReport, PipelineError> {
        let ingest = self.ingest(region, params.time_window_days).await?;
        let results = self.query(params).await?;
        Ok(PullReport { ingest, results })
    }

    /// Query-only cycle.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Storage`] if the store cannot be read.
    pub async fn query(&self, params: &QueryParams) -> Result<Vec<EventRecord>, PipelineError> {
        let results = self.store.query(params).await?;
        info!(
            matched = results.len(),
            limit = params.limit,
            time_window_days = params.time_window_days,
            min_magnitude = params.min_magnitude,
            "Query complete"
        );
        Ok(results)
    }
}
