//! `SQLite` connection configuration.
//!
//! The store never holds a connection between calls: each operation opens
//! one from a [`SqliteConfig`], uses it, and closes it. A connection dropped
//! on an error path is released by its destructor.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::ConnectOptions;

use crate::error::DbError;

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "earthquakes.db";

/// Default time to wait on a locked database before failing.
const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 5;

/// Configuration for opening the `SQLite` store.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path of the database file.
    pub path: PathBuf,
    /// How long to wait on a lock held by another process.
    pub busy_timeout: Duration,
}

impl SqliteConfig {
    /// Create a configuration for the given database file.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: Duration::from_secs(DEFAULT_BUSY_TIMEOUT_SECS),
        }
    }

    /// Set the busy timeout.
    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Open a fresh connection, creating the database file if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the file cannot be opened
    /// or created.
    pub async fn connect(&self) -> Result<SqliteConnection, DbError> {
        let conn = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .busy_timeout(self.busy_timeout)
            .connect()
            .await?;

        tracing::debug!(path = %self.path.display(), "Opened SQLite connection");
        Ok(conn)
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DB_PATH)
    }
}
