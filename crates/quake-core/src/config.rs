//! Configuration loading and typed config structures.
//!
//! The configuration lives in `quake-config.yaml` next to where the binary
//! runs. Every field has a default, so a missing file or an empty document
//! is a valid configuration. Paths and URLs are passed from here into the
//! components at construction; nothing reads them from global state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use quake_catalog::{CatalogConfig, DEFAULT_CATALOG_URL, DEFAULT_FORMAT};
use quake_db::{DEFAULT_DB_PATH, SqliteConfig};
use serde::Deserialize;

use crate::error::ConfigError;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "quake-config.yaml";

/// Default regions file name.
pub const DEFAULT_REGIONS_PATH: &str = "regions.yaml";

/// Top-level configuration.
///
/// Mirrors the structure of `quake-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QuakeConfig {
    /// Upstream catalog settings.
    #[serde(default)]
    pub catalog: UpstreamConfig,

    /// Local store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Regions file settings.
    #[serde(default)]
    pub regions: RegionsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl QuakeConfig {
    /// Read and parse the YAML file at `path`.
    ///
    /// Environment variables override file values:
    /// - `QUAKE_CATALOG_URL` overrides `catalog.base_url`
    /// - `QUAKE_DB_PATH` overrides `storage.db_path`
    /// - `QUAKE_REGIONS_PATH` overrides `regions.path`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    ///
    /// Environment overrides apply in both cases. Callers that care whether
    /// the file was found check `path.exists()` themselves.
    ///
    /// # Errors
    ///
    /// Same as [`QuakeConfig::from_file`] when the file exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override values from the process environment when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Override values using `lookup` as the environment.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("QUAKE_CATALOG_URL") {
            self.catalog.base_url = val;
        }
        if let Some(val) = lookup("QUAKE_DB_PATH") {
            self.storage.db_path = PathBuf::from(val);
        }
        if let Some(val) = lookup("QUAKE_REGIONS_PATH") {
            self.regions.path = PathBuf::from(val);
        }
    }
}

/// Upstream catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamConfig {
    /// FDSN event query endpoint.
    #[serde(default = "default_catalog_url")]
    pub base_url: String,

    /// Output format selector sent as `format`.
    #[serde(default = "default_format")]
    pub format: String,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// Client configuration for [`quake_catalog::CatalogFetcher`].
    pub fn to_catalog_config(&self) -> CatalogConfig {
        CatalogConfig::new(&self.base_url)
            .with_format(&self.format)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            format: default_format(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Local store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// `SQLite` database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Seconds to wait on a database locked by another process.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

impl StorageConfig {
    /// Connection configuration for [`quake_db::EventStore`].
    pub fn to_sqlite_config(&self) -> SqliteConfig {
        SqliteConfig::new(&self.db_path)
            .with_busy_timeout(Duration::from_secs(self.busy_timeout_secs))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

/// Regions file configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegionsConfig {
    /// YAML file holding the default and named regions.
    #[serde(default = "default_regions_path")]
    pub path: PathBuf,

    /// Use the built-in Italy box when the regions file does not exist.
    #[serde(default)]
    pub fallback_to_builtin: bool,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            path: default_regions_path(),
            fallback_to_builtin: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_owned()
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_owned()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

const fn default_busy_timeout_secs() -> u64 {
    5
}

fn default_regions_path() -> PathBuf {
    PathBuf::from(DEFAULT_REGIONS_PATH)
}

fn default_log_level() -> String {
    "info".to_owned()
}
