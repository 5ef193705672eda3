//! Deduplicating event storage and ranked retrieval.
//!
//! One table, `earthquakes`, holds every [`EventRecord`]. A unique index over
//! all six columns is the only identity an event has: inserting a record
//! whose 6-tuple is already present is a silent no-op (`INSERT OR IGNORE`),
//! which makes re-ingesting overlapping windows idempotent.
//!
//! Retrieval orders by magnitude descending; equal magnitudes come back in
//! insertion order (`rowid` ascending).

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use quake_types::{DATE_FORMAT, EventRecord, QueryParams, TIME_FORMAT};
use sqlx::sqlite::SqliteConnection;
use sqlx::Connection;

use crate::error::DbError;
use crate::sqlite::SqliteConfig;

const CREATE_TABLE: &str = r"CREATE TABLE IF NOT EXISTS earthquakes (
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    magnitude REAL NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    place TEXT NOT NULL
)";

const CREATE_UNIQUE_INDEX: &str = r"CREATE UNIQUE INDEX IF NOT EXISTS uq_earthquakes
    ON earthquakes (date, time, magnitude, latitude, longitude, place)";

const INSERT_OR_IGNORE: &str = r"INSERT OR IGNORE INTO earthquakes (date, time, magnitude, latitude, longitude, place)
    VALUES (?, ?, ?, ?, ?, ?)";

const SELECT_RANKED: &str = r"SELECT date, time, magnitude, latitude, longitude, place
    FROM earthquakes
    WHERE magnitude >= ? AND date >= ?
    ORDER BY magnitude DESC, rowid ASC
    LIMIT ?";

/// Operations on the `earthquakes` table.
pub struct EventStore {
    config: SqliteConfig,
}

impl EventStore {
    /// Create a store for the database described by `config`.
    ///
    /// Nothing is opened until the first operation.
    pub const fn new(config: SqliteConfig) -> Self {
        Self { config }
    }

    /// Create the table and its uniqueness constraint if absent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the store cannot be opened
    /// or written.
    pub async fn ensure_schema(&self) -> Result<(), DbError> {
        let mut conn = self.config.connect().await?;
        let mut tx = conn.begin().await?;
        create_schema(&mut tx).await?;
        tx.commit().await?;
        conn.close().await?;
        Ok(())
    }

    /// Insert every record whose 6-tuple is not already stored.
    ///
    /// Schema creation and all inserts share one transaction: a failure
    /// part-way leaves the store exactly as it was before the call.
    ///
    /// Returns the number of rows actually inserted.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the store cannot be opened
    /// or written.
    pub async fn upsert_many(&self, records: &[EventRecord]) -> Result<u64, DbError> {
        let mut conn = self.config.connect().await?;
        let mut tx = conn.begin().await?;
        create_schema(&mut tx).await?;

        let mut inserted: u64 = 0;
        for record in records {
            let result = sqlx::query(INSERT_OR_IGNORE)
                .bind(record.date_text())
                .bind(record.time_text())
                .bind(record.magnitude)
                .bind(record.latitude)
                .bind(record.longitude)
                .bind(&record.place)
                .execute(&mut *tx)
                .await?;
            inserted = inserted.saturating_add(result.rows_affected());
        }

        tx.commit().await?;
        conn.close().await?;

        let ignored = u64::try_from(records.len())
            .unwrap_or(u64::MAX)
            .saturating_sub(inserted);
        tracing::info!(
            received = records.len(),
            inserted,
            ignored,
            "Upserted event records"
        );
        Ok(inserted)
    }

    /// Ranked retrieval relative to today's UTC date.
    ///
    /// # Errors
    ///
    /// See [`EventStore::query_as_of`].
    pub async fn query(&self, params: &QueryParams) -> Result<Vec<EventRecord>, DbError> {
        self.query_as_of(Utc::now().date_naive(), params).await
    }

    /// Records with `magnitude >= params.min_magnitude` dated on or after
    /// `today - params.time_window_days`, strongest first, at most
    /// `params.limit` of them.
    ///
    /// A store that has never been written to yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the store cannot be read,
    /// or [`DbError::CorruptRow`] if a stored date or time does not parse.
    pub async fn query_as_of(
        &self,
        today: NaiveDate,
        params: &QueryParams,
    ) -> Result<Vec<EventRecord>, DbError> {
        let cutoff = recency_cutoff(today, params.time_window_days);

        let mut conn = self.config.connect().await?;
        let mut tx = conn.begin().await?;
        create_schema(&mut tx).await?;
        tx.commit().await?;

        let rows = sqlx::query_as::<_, EventRow>(SELECT_RANKED)
            .bind(params.min_magnitude)
            .bind(cutoff.format(DATE_FORMAT).to_string())
            .bind(i64::from(params.limit))
            .fetch_all(&mut conn)
            .await?;
        conn.close().await?;

        tracing::debug!(
            count = rows.len(),
            %cutoff,
            min_magnitude = params.min_magnitude,
            limit = params.limit,
            "Queried event records"
        );

        rows.into_iter().map(EventRecord::try_from).collect()
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the store cannot be read.
    pub async fn count(&self) -> Result<u64, DbError> {
        let mut conn = self.config.connect().await?;
        let mut tx = conn.begin().await?;
        create_schema(&mut tx).await?;
        tx.commit().await?;

        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM earthquakes")
            .fetch_one(&mut conn)
            .await?;
        conn.close().await?;

        Ok(u64::try_from(row.0).unwrap_or(0))
    }
}

/// Earliest date a record may carry to fall inside a `days`-long window
/// ending `today`. Windows reaching before the calendar's start clamp to it.
pub fn recency_cutoff(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

async fn create_schema(conn: &mut SqliteConnection) -> Result<(), DbError> {
    sqlx::query(CREATE_TABLE).execute(&mut *conn).await?;
    sqlx::query(CREATE_UNIQUE_INDEX).execute(&mut *conn).await?;
    Ok(())
}

/// A row from the `earthquakes` table.
///
/// Date and time are stored as text so the unique index compares exactly
/// what was written.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM:SS`.
    pub time: String,
    /// Event magnitude.
    pub magnitude: f64,
    /// Epicentre latitude.
    pub latitude: f64,
    /// Epicentre longitude.
    pub longitude: f64,
    /// Location description.
    pub place: String,
}

impl TryFrom<EventRow> for EventRecord {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT)
            .map_err(|e| DbError::CorruptRow(format!("date {:?}: {e}", row.date)))?;
        let time = NaiveTime::parse_from_str(&row.time, TIME_FORMAT)
            .map_err(|e| DbError::CorruptRow(format!("time {:?}: {e}", row.time)))?;

        Ok(Self {
            date,
            time,
            magnitude: row.magnitude,
            latitude: row.latitude,
            longitude: row.longitude,
            place: row.place,
        })
    }
}
