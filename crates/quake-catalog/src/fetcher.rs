//! Single-request client for an FDSN event web service.
//!
//! One call to [`CatalogFetcher::fetch`] is one HTTP GET: no retries, no
//! pagination. The response is checked for a `features` array and each
//! entry is handed back untouched as a [`RawEvent`].

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use quake_types::{GeoBox, RawEvent};
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::error::CatalogError;

/// Default FDSN event endpoint (INGV).
pub const DEFAULT_CATALOG_URL: &str = "https://webservices.ingv.it/fdsnws/event/1/query";

/// Default value of the `format` query parameter.
pub const DEFAULT_FORMAT: &str = "geojson";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Timestamp format of the `starttime`/`endtime` parameters.
const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Maximum number of error-body characters kept in an error message.
const ERROR_BODY_LIMIT: usize = 200;

/// Configuration for the catalog client.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Full query endpoint URL.
    pub base_url: String,
    /// Output format selector sent as `format`.
    pub format: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl CatalogConfig {
    /// Create a configuration for the given endpoint with default format and
    /// timeout.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            format: DEFAULT_FORMAT.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the output format selector.
    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        format.clone_into(&mut self.format);
        self
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CATALOG_URL)
    }
}

/// Absolute UTC time range of a catalog query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Inclusive start of the range.
    pub start: DateTime<Utc>,
    /// End of the range.
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The `days`-long window ending at `end`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::WindowOutOfRange`] if the start would fall
    /// outside the representable date range.
    pub fn ending_at(end: DateTime<Utc>, days: u32) -> Result<Self, CatalogError> {
        let start = TimeDelta::try_days(i64::from(days))
            .and_then(|delta| end.checked_sub_signed(delta))
            .ok_or(CatalogError::WindowOutOfRange { days })?;
        Ok(Self { start, end })
    }

    /// `starttime` parameter value.
    pub fn start_param(&self) -> String {
        self.start.format(QUERY_TIME_FORMAT).to_string()
    }

    /// `endtime` parameter value.
    pub fn end_param(&self) -> String {
        self.end.format(QUERY_TIME_FORMAT).to_string()
    }
}

/// HTTP client for the upstream event catalog.
pub struct CatalogFetcher {
    client: reqwest::Client,
    base_url: String,
    format: String,
}

impl CatalogFetcher {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UpstreamUnavailable`] if the HTTP client
    /// cannot be constructed (for example, no TLS backend).
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                CatalogError::UpstreamUnavailable(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            format: config.format.clone(),
        })
    }

    /// Fetch every event of the last `time_window_days` days inside `geo_box`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UpstreamUnavailable`] on network failure,
    /// timeout or non-success status, and [`CatalogError::MalformedResponse`]
    /// if the body lacks a `features` array.
    pub async fn fetch(
        &self,
        time_window_days: u32,
        geo_box: &GeoBox,
    ) -> Result<Vec<RawEvent>, CatalogError> {
        let window = TimeWindow::ending_at(Utc::now(), time_window_days)?;
        self.fetch_window(&window, geo_box).await
    }

    /// Fetch every event inside `geo_box` within an explicit time range.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogFetcher::fetch`].
    pub async fn fetch_window(
        &self,
        window: &TimeWindow,
        geo_box: &GeoBox,
    ) -> Result<Vec<RawEvent>, CatalogError> {
        let params = self.query_params(window, geo_box);
        debug!(url = %self.base_url, ?params, "Querying event catalog");

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| CatalogError::UpstreamUnavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            info!(%geo_box, "Catalog returned no events");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            let error_body: String = error_body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(CatalogError::UpstreamUnavailable(format!(
                "catalog returned {status}: {error_body}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CatalogError::UpstreamUnavailable(format!("reading body failed: {e}")))?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| CatalogError::MalformedResponse(format!("body is not JSON: {e}")))?;

        let events = extract_features(body)?;
        info!(count = events.len(), %geo_box, "Fetched catalog events");
        Ok(events)
    }

    fn query_params(&self, window: &TimeWindow, geo_box: &GeoBox) -> Vec<(&'static str, String)> {
        vec![
            ("format", self.format.clone()),
            ("starttime", window.start_param()),
            ("endtime", window.end_param()),
            ("minlatitude", geo_box.min_latitude().to_string()),
            ("maxlatitude", geo_box.max_latitude().to_string()),
            ("minlongitude", geo_box.min_longitude().to_string()),
            ("maxlongitude", geo_box.max_longitude().to_string()),
        ]
    }
}

/// Pull the `features` array out of a catalog document.
///
/// # Errors
///
/// Returns [`CatalogError::MalformedResponse`] if the document is not an
/// object or `features` is missing or not an array.
pub fn extract_features(body: serde_json::Value) -> Result<Vec<RawEvent>, CatalogError> {
    let serde_json::Value::Object(mut document) = body else {
        return Err(CatalogError::MalformedResponse(
            "top-level document is not an object".to_owned(),
        ));
    };

    match document.remove("features") {
        Some(serde_json::Value::Array(features)) => {
            Ok(features.into_iter().map(RawEvent).collect())
        }
        Some(other) => Err(CatalogError::MalformedResponse(format!(
            "'features' is not an array (found {})",
            json_kind(&other)
        ))),
        None => Err(CatalogError::MalformedResponse(
            "'features' is missing".to_owned(),
        )),
    }
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn window_formats_second_precision_utc() {
        let end = Utc
            .with_ymd_and_hms(2026, 3, 10, 8, 30, 15)
            .single()
            .unwrap_or_default();
        let window = TimeWindow::ending_at(end, 7);
        assert!(window.is_ok());
        let window = window.unwrap_or(TimeWindow { start: end, end });
        assert_eq!(window.start_param(), "2026-03-03T08:30:15");
        assert_eq!(window.end_param(), "2026-03-10T08:30:15");
    }

    #[test]
    fn zero_day_window_is_empty_range() {
        let end = Utc::now();
        let window = TimeWindow::ending_at(end, 0);
        assert!(matches!(window, Ok(w) if w.start == w.end));
    }

    #[test]
    fn huge_window_is_rejected() {
        let window = TimeWindow::ending_at(Utc::now(), u32::MAX);
        assert!(matches!(
            window,
            Err(CatalogError::WindowOutOfRange { days: u32::MAX })
        ));
    }

    #[test]
    fn features_array_is_extracted_in_order() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [{"id": 1}, {"id": 2}]
        });
        let events = extract_features(body);
        assert!(events.is_ok());
        let events = events.unwrap_or_default();
        assert_eq!(events.len(), 2);
        assert_eq!(events.first().map(|e| &e.0["id"]), Some(&json!(1)));
    }

    #[test]
    fn missing_features_is_malformed() {
        let result = extract_features(json!({"not_features": []}));
        assert!(matches!(result, Err(CatalogError::MalformedResponse(_))));
    }

    #[test]
    fn non_array_features_is_malformed() {
        let result = extract_features(json!({"features": {"0": {}}}));
        assert!(matches!(result, Err(CatalogError::MalformedResponse(msg)) if msg.contains("object")));
    }

    #[test]
    fn non_object_document_is_malformed() {
        let result = extract_features(json!([1, 2, 3]));
        assert!(matches!(result, Err(CatalogError::MalformedResponse(_))));
    }

    #[test]
    fn query_params_carry_box_and_format() {
        let fetcher = CatalogFetcher::new(&CatalogConfig::default());
        assert!(fetcher.is_ok());
        let Ok(fetcher) = fetcher else { return };
        let end = Utc::now();
        let window = TimeWindow { start: end, end };
        let params = fetcher.query_params(&window, &GeoBox::italy());
        let lookup = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(lookup("format").as_deref(), Some("geojson"));
        assert_eq!(lookup("minlatitude").as_deref(), Some("35"));
        assert_eq!(lookup("maxlatitude").as_deref(), Some("47.5"));
        assert_eq!(lookup("minlongitude").as_deref(), Some("5"));
        assert_eq!(lookup("maxlongitude").as_deref(), Some("20"));
    }
}
