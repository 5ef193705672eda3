//! Geographic box lookup.
//!
//! Regions live in a small YAML file. Two shapes are accepted:
//!
//! ```yaml
//! # a single default box
//! min_latitude: 35.0
//! max_latitude: 47.5
//! min_longitude: 5.0
//! max_longitude: 20.0
//! ```
//!
//! ```yaml
//! # a default plus named boxes
//! default:
//!   min_latitude: 35.0
//!   max_latitude: 47.5
//!   min_longitude: 5.0
//!   max_longitude: 20.0
//! regions:
//!   sicily:
//!     min_latitude: 36.5
//!     max_latitude: 38.4
//!     min_longitude: 12.3
//!     max_longitude: 15.7
//! ```
//!
//! Every problem with the file is a [`ConfigError`] raised by
//! [`BoxProvider::resolve`], which the pipeline calls before it touches the
//! network.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use quake_types::GeoBox;
use serde::Serialize;
use serde_yml::Value;

use crate::error::ConfigError;

/// The four fields every region record must carry, in constructor order.
const BOUND_FIELDS: [&str; 4] = ["min_latitude", "max_latitude", "min_longitude", "max_longitude"];

/// Record name used in errors for the default region.
const DEFAULT_LABEL: &str = "default";

/// A resolved box together with the region name it was looked up under.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedBox {
    /// Region name, `None` for the default region.
    pub name: Option<String>,
    /// The bounds.
    pub geo_box: GeoBox,
}

impl core::fmt::Display for NamedBox {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = self.name.as_deref().unwrap_or(DEFAULT_LABEL);
        write!(f, "{name} ({})", self.geo_box)
    }
}

/// Supplies the box a pull cycle queries.
pub trait BoxProvider {
    /// Resolve `region` (or the default region when `None`) to a box.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the source is unreadable or malformed, the
    /// name is unknown, or no default exists.
    fn resolve(&self, region: Option<&str>) -> Result<NamedBox, ConfigError>;
}

/// Parsed contents of a regions file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<GeoBox>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    regions: BTreeMap<String, GeoBox>,
}

impl RegionTable {
    /// A table whose only entry is the built-in Italy default.
    pub const fn builtin() -> Self {
        Self {
            default: Some(GeoBox::italy()),
            regions: BTreeMap::new(),
        }
    }

    /// Read and parse a regions file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`RegionTable::parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse regions from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] for invalid YAML,
    /// [`ConfigError::InvalidRegions`] for an unrecognized shape, and
    /// [`ConfigError::InvalidBox`] for a record with missing, non-numeric or
    /// inconsistent bounds.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let document: Value = serde_yml::from_str(yaml)?;
        let Some(mapping) = document.as_mapping() else {
            return Err(ConfigError::InvalidRegions(
                "expected a mapping of bounds or of regions".to_owned(),
            ));
        };

        let is_single_record = BOUND_FIELDS.iter().any(|field| mapping.contains_key(*field));
        if is_single_record {
            return Ok(Self {
                default: Some(parse_box(DEFAULT_LABEL, &document)?),
                regions: BTreeMap::new(),
            });
        }

        let default = document
            .get(DEFAULT_LABEL)
            .map(|record| parse_box(DEFAULT_LABEL, record))
            .transpose()?;

        let mut regions = BTreeMap::new();
        if let Some(named) = document.get("regions") {
            let named = named.as_mapping().ok_or_else(|| {
                ConfigError::InvalidRegions("'regions' must be a mapping of name to bounds".to_owned())
            })?;
            for (key, record) in named {
                let name = key.as_str().ok_or_else(|| {
                    ConfigError::InvalidRegions(format!("region name {key:?} is not a string"))
                })?;
                regions.insert(name.to_owned(), parse_box(name, record)?);
            }
        }

        if default.is_none() && regions.is_empty() {
            return Err(ConfigError::InvalidRegions(
                "no default region and no named regions".to_owned(),
            ));
        }

        Ok(Self { default, regions })
    }

    /// Look up a named region, or the default when `region` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRegion`] or
    /// [`ConfigError::NoDefaultRegion`].
    pub fn lookup(&self, region: Option<&str>) -> Result<NamedBox, ConfigError> {
        match region {
            Some(name) => self
                .regions
                .get(name)
                .map(|geo_box| NamedBox {
                    name: Some(name.to_owned()),
                    geo_box: *geo_box,
                })
                .ok_or_else(|| ConfigError::UnknownRegion(name.to_owned())),
            None => self
                .default
                .map(|geo_box| NamedBox {
                    name: None,
                    geo_box,
                })
                .ok_or(ConfigError::NoDefaultRegion),
        }
    }

    /// Render the table in the regions file format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yml::to_string(self)?)
    }

    /// Write the table to `path`, refusing to replace an existing file
    /// unless `overwrite` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists (without `overwrite`)
    /// or cannot be written.
    pub fn write(&self, path: &Path, overwrite: bool) -> Result<(), ConfigError> {
        if path.exists() && !overwrite {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "regions file already exists",
                ),
            });
        }
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Wrote regions file");
        Ok(())
    }
}

/// Regions read from a YAML file on every resolution.
#[derive(Debug, Clone)]
pub struct RegionFile {
    path: PathBuf,
    fallback_to_builtin: bool,
}

impl RegionFile {
    /// A provider reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fallback_to_builtin: false,
        }
    }

    /// Use [`RegionTable::builtin`] when the file does not exist.
    #[must_use]
    pub const fn with_builtin_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_builtin = enabled;
        self
    }

    fn table(&self) -> Result<RegionTable, ConfigError> {
        if self.fallback_to_builtin && !self.path.exists() {
            tracing::warn!(
                path = %self.path.display(),
                "Regions file not found, using built-in default region"
            );
            return Ok(RegionTable::builtin());
        }
        RegionTable::load(&self.path)
    }
}

impl BoxProvider for RegionFile {
    fn resolve(&self, region: Option<&str>) -> Result<NamedBox, ConfigError> {
        let resolved = self.table()?.lookup(region)?;
        tracing::debug!(region = %resolved, "Resolved region");
        Ok(resolved)
    }
}

fn parse_box(label: &str, record: &Value) -> Result<GeoBox, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBox {
        region: label.to_owned(),
        reason,
    };

    if !record.is_mapping() {
        return Err(invalid("expected a mapping of bounds".to_owned()));
    }

    let mut bounds = [0.0_f64; 4];
    for (slot, field) in bounds.iter_mut().zip(BOUND_FIELDS) {
        let value = record
            .get(field)
            .ok_or_else(|| invalid(format!("missing field {field}")))?;
        *slot = numeric(value).ok_or_else(|| invalid(format!("{field} is not numeric")))?;
    }

    let [min_latitude, max_latitude, min_longitude, max_longitude] = bounds;
    GeoBox::new(min_latitude, max_latitude, min_longitude, max_longitude)
        .map_err(|e| invalid(e.to_string()))
}

/// YAML numbers, or strings holding a number.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
