//! Raw catalog payload normalization into [`EventRecord`]s.
//!
//! The catalog returns `GeoJSON` features. A usable feature carries
//! `properties.time`, `properties.mag` and at least two entries in
//! `geometry.coordinates` (longitude first). Anything else is skipped with
//! a debug log: one bad upstream entry never costs the rest of the batch.

use chrono::{NaiveDateTime, Timelike};
use quake_types::{EventRecord, RawEvent};
use serde_json::Value;
use tracing::{debug, info};

/// Timestamp with fractional seconds, e.g. `2026-01-04T13:05:09.120000`.
const FRACTIONAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Timestamp with whole seconds, e.g. `2026-01-04T13:05:09`.
const WHOLE_SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Nanosecond value at which chrono starts representing a leap second.
const LEAP_SECOND_NANOS: u32 = 1_000_000_000;

/// Why a raw event was dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    /// `properties.time` is absent or null.
    #[error("missing timestamp")]
    MissingTime,

    /// `properties.mag` is absent or null.
    #[error("missing magnitude")]
    MissingMagnitude,

    /// `geometry.coordinates` has fewer than two entries or is not a list.
    #[error("expected at least 2 coordinates, found {0}")]
    TooFewCoordinates(usize),

    /// The timestamp matches neither accepted format.
    #[error("unparseable timestamp {0:?}")]
    BadTimestamp(String),

    /// The magnitude is not a finite real number.
    #[error("magnitude is not a number: {0}")]
    BadMagnitude(String),

    /// A coordinate is not a finite real number.
    #[error("coordinate is not a number: {0}")]
    BadCoordinate(String),
}

/// Normalize a batch of raw events, preserving input order.
///
/// Malformed events are dropped; see [`normalize_event`] for the rules.
pub fn normalize(raw_events: &[RawEvent]) -> Vec<EventRecord> {
    let records: Vec<EventRecord> = raw_events
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match normalize_event(raw) {
            Ok(record) => Some(record),
            Err(reason) => {
                debug!(index, %reason, "Skipping malformed catalog event");
                None
            }
        })
        .collect();

    let skipped = raw_events.len().saturating_sub(records.len());
    info!(
        received = raw_events.len(),
        normalized = records.len(),
        skipped,
        "Normalized catalog events"
    );
    records
}

/// Normalize a single raw event.
///
/// # Errors
///
/// Returns the [`SkipReason`] describing the first defect found.
pub fn normalize_event(raw: &RawEvent) -> Result<EventRecord, SkipReason> {
    let event = raw.as_json();
    let properties = event.get("properties");
    let coordinates = event
        .get("geometry")
        .and_then(|geometry| geometry.get("coordinates"));

    let time_raw = present(properties.and_then(|p| p.get("time"))).ok_or(SkipReason::MissingTime)?;
    let mag_raw =
        present(properties.and_then(|p| p.get("mag"))).ok_or(SkipReason::MissingMagnitude)?;

    let coordinates = match coordinates {
        Some(Value::Array(items)) if items.len() >= 2 => items,
        Some(Value::Array(items)) => return Err(SkipReason::TooFewCoordinates(items.len())),
        _ => return Err(SkipReason::TooFewCoordinates(0)),
    };

    let timestamp = parse_timestamp(time_raw)?;
    let magnitude = coerce_real(mag_raw).ok_or_else(|| SkipReason::BadMagnitude(mag_raw.to_string()))?;
    let longitude = coordinate(coordinates.first())?;
    let latitude = coordinate(coordinates.get(1))?;

    let place = properties
        .and_then(|p| p.get("place"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    let time = timestamp
        .time()
        .with_nanosecond(0)
        .ok_or_else(|| SkipReason::BadTimestamp(time_raw.to_string()))?;

    Ok(EventRecord {
        date: timestamp.date(),
        time,
        magnitude,
        latitude,
        longitude,
        place,
    })
}

/// Treat JSON `null` the same as an absent key.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Parse a catalog timestamp, fractional form first, whole seconds second.
fn parse_timestamp(value: &Value) -> Result<NaiveDateTime, SkipReason> {
    let text = value
        .as_str()
        .ok_or_else(|| SkipReason::BadTimestamp(value.to_string()))?;

    let timestamp = NaiveDateTime::parse_from_str(text, FRACTIONAL_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, WHOLE_SECONDS_FORMAT))
        .ok()
        .ok_or_else(|| SkipReason::BadTimestamp(text.to_owned()))?;

    // chrono encodes a leap second (`:60`) as nanosecond >= 1e9.
    if timestamp.nanosecond() >= LEAP_SECOND_NANOS {
        return Err(SkipReason::BadTimestamp(text.to_owned()));
    }
    Ok(timestamp)
}

fn coordinate(value: Option<&Value>) -> Result<f64, SkipReason> {
    let value = value.ok_or(SkipReason::TooFewCoordinates(0))?;
    coerce_real(value).ok_or_else(|| SkipReason::BadCoordinate(value.to_string()))
}

/// Accept JSON numbers and numeric strings; reject NaN and infinities.
fn coerce_real(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}
