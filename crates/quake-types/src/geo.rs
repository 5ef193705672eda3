//! Rectangular latitude/longitude regions.
//!
//! A [`GeoBox`] bounds both the upstream catalog query and the set of
//! events the operator cares about. Boxes are validated on construction so
//! an inverted or out-of-range box never reaches the network.

use serde::Serialize;

/// Valid latitude range in degrees.
const LATITUDE_LIMIT: f64 = 90.0;

/// Valid longitude range in degrees.
const LONGITUDE_LIMIT: f64 = 180.0;

/// Reasons a set of bounds does not form a valid [`GeoBox`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoBoxError {
    /// A bound is NaN or infinite.
    #[error("{field} must be a finite number, got {value}")]
    NotFinite {
        /// Name of the offending bound.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A bound lies outside the valid coordinate range.
    #[error("{field} = {value} is outside [-{limit}, {limit}]")]
    OutOfRange {
        /// Name of the offending bound.
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// Absolute limit for this axis.
        limit: f64,
    },

    /// The minimum bound of an axis exceeds its maximum.
    #[error("{axis} bounds are inverted: min {min} > max {max}")]
    Inverted {
        /// `latitude` or `longitude`.
        axis: &'static str,
        /// The minimum bound.
        min: f64,
        /// The maximum bound.
        max: f64,
    },
}

/// A rectangular region defined by four coordinate bounds in degrees.
///
/// Invariant: `min_latitude <= max_latitude` and
/// `min_longitude <= max_longitude`, all values finite and within range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBox {
    min_latitude: f64,
    max_latitude: f64,
    min_longitude: f64,
    max_longitude: f64,
}

impl GeoBox {
    /// Build a validated box.
    ///
    /// # Errors
    ///
    /// Returns [`GeoBoxError`] if any bound is non-finite, out of range, or
    /// if either axis is inverted.
    pub fn new(
        min_latitude: f64,
        max_latitude: f64,
        min_longitude: f64,
        max_longitude: f64,
    ) -> Result<Self, GeoBoxError> {
        check_bound("min_latitude", min_latitude, LATITUDE_LIMIT)?;
        check_bound("max_latitude", max_latitude, LATITUDE_LIMIT)?;
        check_bound("min_longitude", min_longitude, LONGITUDE_LIMIT)?;
        check_bound("max_longitude", max_longitude, LONGITUDE_LIMIT)?;

        if min_latitude > max_latitude {
            return Err(GeoBoxError::Inverted {
                axis: "latitude",
                min: min_latitude,
                max: max_latitude,
            });
        }
        if min_longitude > max_longitude {
            return Err(GeoBoxError::Inverted {
                axis: "longitude",
                min: min_longitude,
                max: max_longitude,
            });
        }

        Ok(Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        })
    }

    /// The built-in default region covering Italy.
    pub const fn italy() -> Self {
        Self {
            min_latitude: 35.0,
            max_latitude: 47.5,
            min_longitude: 5.0,
            max_longitude: 20.0,
        }
    }

    /// Southern bound.
    pub const fn min_latitude(&self) -> f64 {
        self.min_latitude
    }

    /// Northern bound.
    pub const fn max_latitude(&self) -> f64 {
        self.max_latitude
    }

    /// Western bound.
    pub const fn min_longitude(&self) -> f64 {
        self.min_longitude
    }

    /// Eastern bound.
    pub const fn max_longitude(&self) -> f64 {
        self.max_longitude
    }

    /// Whether the point lies inside the box, bounds inclusive.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&latitude)
            && (self.min_longitude..=self.max_longitude).contains(&longitude)
    }
}

impl core::fmt::Display for GeoBox {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "lat [{}, {}] lon [{}, {}]",
            self.min_latitude, self.max_latitude, self.min_longitude, self.max_longitude
        )
    }
}

fn check_bound(field: &'static str, value: f64, limit: f64) -> Result<(), GeoBoxError> {
    if !value.is_finite() {
        return Err(GeoBoxError::NotFinite { field, value });
    }
    if value < -limit || value > limit {
        return Err(GeoBoxError::OutOfRange {
            field,
            value,
            limit,
        });
    }
    Ok(())
}
