//! Plain-text rendering of query results for stdout.

use quake_types::EventRecord;

/// Render records in ranked order, two lines per record followed by a
/// blank line.
pub fn render(records: &[EventRecord]) -> String {
    records.iter().map(render_record).collect()
}

fn render_record(record: &EventRecord) -> String {
    format!(
        "day: {}, time: {}, magnitude: {}\nlat: {}, lon: {}, place: {}\n\n",
        record.date_text(),
        record.time_text(),
        real(record.magnitude),
        real(record.latitude),
        real(record.longitude),
        record.place,
    )
}

/// Shortest round-trip form, always with a fractional part (`3.0`, not `3`).
fn real(value: f64) -> String {
    format!("{value:?}")
}
