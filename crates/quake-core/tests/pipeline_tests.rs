//! End-to-end tests for the pull and query cycles.
//!
//! A fake catalog runs in-process on an ephemeral port and counts the
//! requests it receives; the store is a temporary `SQLite` file.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::panic
)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use chrono::{Days, Utc};
use quake_catalog::{CatalogConfig, CatalogFetcher};
use quake_core::{ConfigError, ErrorKind, Pipeline, PipelineError, RegionFile};
use quake_db::{EventStore, SqliteConfig};
use quake_types::QueryParams;
use tempfile::TempDir;
use tokio::net::TcpListener;

const QUERY_PATH: &str = "/fdsnws/event/1/query";

const ITALY_REGIONS: &str = "
default:
  min_latitude: 35.0
  max_latitude: 47.5
  min_longitude: 5.0
  max_longitude: 20.0
regions:
  sicily:
    min_latitude: 36.5
    max_latitude: 38.4
    min_longitude: 12.3
    max_longitude: 15.7
";

async fn spawn_catalog(status: StatusCode, body: String) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = Arc::clone(&hits);
    let app = Router::new().route(
        QUERY_PATH,
        get(move || {
            let hits = Arc::clone(&handler_hits);
            let body = body.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (status, body)
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}{QUERY_PATH}"), hits)
}

/// A catalog document with three usable events from the last two days,
/// one ancient event, and one without a magnitude.
fn recent_catalog_body() -> String {
    let today = Utc::now().date_naive();
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap();
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            feature(&format!("{yesterday}T08:15:00.250000"), 3.1, 13.5, 42.3, "Amatrice"),
            feature(&format!("{today}T01:02:03.456000"), 4.8, 15.0, 37.7, "Etna"),
            feature(&format!("{today}T05:00:00"), 2.2, 14.1, 40.8, "Pozzuoli"),
            feature("2000-01-01T00:00:00.0", 5.9, 13.0, 42.0, "Old"),
            {
                "type": "Feature",
                "properties": {"time": format!("{today}T06:00:00"), "mag": null, "place": "No mag"},
                "geometry": {"type": "Point", "coordinates": [12.0, 43.0, 8.0]}
            }
        ]
    })
    .to_string()
}

fn feature(time: &str, mag: f64, lon: f64, lat: f64, place: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "Feature",
        "properties": {"time": time, "mag": mag, "place": place},
        "geometry": {"type": "Point", "coordinates": [lon, lat, 10.0]}
    })
}

fn write_regions(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("regions.yaml");
    std::fs::write(&path, contents).unwrap();
    path
}

fn pipeline(catalog_url: &str, regions: &Path, dir: &TempDir) -> Pipeline<RegionFile> {
    let fetcher =
        CatalogFetcher::new(&CatalogConfig::new(catalog_url).with_timeout(Duration::from_secs(5)))
            .unwrap();
    let store = EventStore::new(SqliteConfig::new(dir.path().join("earthquakes.db")));
    Pipeline::new(RegionFile::new(regions), fetcher, store)
}

const fn params(limit: u32, time_window_days: u32, min_magnitude: f64) -> QueryParams {
    QueryParams {
        limit,
        time_window_days,
        min_magnitude,
    }
}

#[tokio::test]
async fn pull_stores_and_ranks_recent_events() {
    let dir = TempDir::new().unwrap();
    let (url, hits) = spawn_catalog(StatusCode::OK, recent_catalog_body()).await;
    let regions = write_regions(&dir, ITALY_REGIONS);
    let pipeline = pipeline(&url, &regions, &dir);

    let report = pipeline.pull(None, &params(10, 7, 0.0)).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(report.ingest.region.name, None);
    assert_eq!(report.ingest.fetched, 5);
    assert_eq!(report.ingest.normalized, 4);
    assert_eq!(report.ingest.inserted, 4);

    // The 2000-01-01 event is stored but outside the seven-day window.
    let places: Vec<&str> = report.results.iter().map(|r| r.place.as_str()).collect();
    assert_eq!(places, vec!["Etna", "Amatrice", "Pozzuoli"]);
    assert_eq!(report.results[0].time_text(), "01:02:03");
}

#[tokio::test]
async fn repeated_pull_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let (url, hits) = spawn_catalog(StatusCode::OK, recent_catalog_body()).await;
    let regions = write_regions(&dir, ITALY_REGIONS);
    let pipeline = pipeline(&url, &regions, &dir);

    let first = pipeline.pull(None, &params(10, 7, 0.0)).await.unwrap();
    let second = pipeline.pull(Some("sicily"), &params(10, 7, 0.0)).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(second.ingest.region.name.as_deref(), Some("sicily"));
    assert_eq!(second.ingest.inserted, 0);
    assert_eq!(first.results, second.results);
    assert_eq!(pipeline.store().count().await.unwrap(), 4);
}

#[tokio::test]
async fn incomplete_box_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    let (url, hits) = spawn_catalog(StatusCode::OK, recent_catalog_body()).await;
    let regions = write_regions(&dir, "min_latitude: 35.0\nmax_latitude: 47.5\n");
    let pipeline = pipeline(&url, &regions, &dir);

    let result = pipeline.pull(None, &params(10, 7, 0.0)).await;

    match result {
        Err(err @ PipelineError::Config(ConfigError::InvalidBox { .. })) => {
            assert_eq!(err.kind(), ErrorKind::Configuration);
        }
        other => panic!("expected InvalidBox, got {other:?}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_region_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    let (url, hits) = spawn_catalog(StatusCode::OK, recent_catalog_body()).await;
    let regions = write_regions(&dir, ITALY_REGIONS);
    let pipeline = pipeline(&url, &regions, &dir);

    let result = pipeline.pull(Some("atlantis"), &params(10, 7, 0.0)).await;

    assert!(matches!(
        result,
        Err(PipelineError::Config(ConfigError::UnknownRegion(_)))
    ));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_regions_file_fails_unless_fallback_enabled() {
    let dir = TempDir::new().unwrap();
    let (url, hits) = spawn_catalog(StatusCode::OK, recent_catalog_body()).await;
    let missing = dir.path().join("absent.yaml");

    let strict = pipeline(&url, &missing, &dir);
    let result = strict.ingest(None, 7).await;
    assert!(matches!(
        result,
        Err(PipelineError::Config(ConfigError::Io { .. }))
    ));
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    let fetcher = CatalogFetcher::new(&CatalogConfig::new(&url)).unwrap();
    let store = EventStore::new(SqliteConfig::new(dir.path().join("earthquakes.db")));
    let lenient = Pipeline::new(
        RegionFile::new(&missing).with_builtin_fallback(true),
        fetcher,
        store,
    );
    let report = lenient.ingest(None, 7).await.unwrap();
    assert_eq!(report.inserted, 4);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn upstream_failure_aborts_cycle_and_leaves_store_empty() {
    let dir = TempDir::new().unwrap();
    let (url, _hits) = spawn_catalog(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_owned()).await;
    let regions = write_regions(&dir, ITALY_REGIONS);
    let pipeline = pipeline(&url, &regions, &dir);

    let result = pipeline.pull(None, &params(10, 7, 0.0)).await;

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert_eq!(pipeline.store().count().await.unwrap(), 0);
}

#[tokio::test]
async fn malformed_catalog_document_is_reported() {
    let dir = TempDir::new().unwrap();
    let (url, _hits) = spawn_catalog(StatusCode::OK, r#"{"not_features": []}"#.to_owned()).await;
    let regions = write_regions(&dir, ITALY_REGIONS);
    let pipeline = pipeline(&url, &regions, &dir);

    let err = pipeline.pull(None, &params(10, 7, 0.0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn query_only_cycle_reads_without_fetching() {
    let dir = TempDir::new().unwrap();
    let (url, hits) = spawn_catalog(StatusCode::OK, recent_catalog_body()).await;
    let regions = write_regions(&dir, ITALY_REGIONS);
    let pipeline = pipeline(&url, &regions, &dir);

    assert!(pipeline.query(&params(10, 7, 0.0)).await.unwrap().is_empty());

    pipeline.ingest(None, 7).await.unwrap();
    let strong = pipeline.query(&params(10, 7, 3.0)).await.unwrap();
    let mags: Vec<f64> = strong.iter().map(|r| r.magnitude).collect();
    assert_eq!(mags, vec![4.8, 3.1]);

    let everything = pipeline.query(&params(10, 36_500, 0.0)).await.unwrap();
    assert_eq!(everything.len(), 4);
    assert_eq!(everything[0].place, "Old");

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
