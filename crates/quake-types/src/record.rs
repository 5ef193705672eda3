//! Event payloads and the canonical persisted record.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Storage and display format for [`EventRecord::date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage and display format for [`EventRecord::time`].
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// One upstream event payload, exactly as the catalog returned it.
///
/// The catalog speaks `GeoJSON`, so this is a `Feature` object. Nothing is
/// assumed about its shape until normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEvent(pub serde_json::Value);

impl RawEvent {
    /// Borrow the underlying JSON value.
    pub const fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for RawEvent {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A normalized seismic event.
///
/// The full 6-tuple is the deduplication key in the store: two events that
/// agree on every field are the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Calendar date of the origin time (UTC).
    pub date: NaiveDate,
    /// Time of day of the origin time, whole seconds (UTC).
    pub time: NaiveTime,
    /// Event magnitude.
    pub magnitude: f64,
    /// Epicentre latitude in degrees.
    pub latitude: f64,
    /// Epicentre longitude in degrees.
    pub longitude: f64,
    /// Free-text location description, empty when the catalog gave none.
    pub place: String,
}

impl EventRecord {
    /// The date column value, `YYYY-MM-DD`.
    pub fn date_text(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// The time column value, `HH:MM:SS`.
    pub fn time_text(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

/// Parameters of a retrieval query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryParams {
    /// Maximum number of records to return. Zero yields an empty result.
    pub limit: u32,
    /// Only records dated on or after `today - time_window_days`.
    pub time_window_days: u32,
    /// Only records with at least this magnitude.
    pub min_magnitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_text_drops_subseconds() {
        let record = EventRecord {
            date: NaiveDate::from_ymd_opt(2026, 1, 4).unwrap_or_default(),
            time: NaiveTime::from_hms_opt(13, 5, 9).unwrap_or_default(),
            magnitude: 9.5,
            latitude: 42.0,
            longitude: 13.0,
            place: "Test D".to_owned(),
        };
        assert_eq!(record.date_text(), "2026-01-04");
        assert_eq!(record.time_text(), "13:05:09");
    }

    #[test]
    fn raw_event_is_transparent_json() {
        let json = serde_json::json!({"type": "Feature", "properties": {"mag": 2.0}});
        let raw = RawEvent::from(json.clone());
        assert_eq!(raw.as_json(), &json);
        let encoded = serde_json::to_value(&raw).unwrap_or_default();
        assert_eq!(encoded, json);
    }
}
