//! Coordinate types and validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Errors produced when constructing coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),
}

/// A validated geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !is_valid_latitude(latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !is_valid_longitude(longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Cache fingerprint for this coordinate.
    pub fn key(&self) -> String {
        super::cache_key(self.latitude, self.longitude)
    }

    /// Planar degree distance to another coordinate.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        super::planar_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Returns true when `lat` is finite and within [-90, 90].
#[inline]
pub fn is_valid_latitude(lat: f64) -> bool {
    lat.is_finite() && (MIN_LAT..=MAX_LAT).contains(&lat)
}

/// Returns true when `lon` is finite and within [-180, 180].
#[inline]
pub fn is_valid_longitude(lon: f64) -> bool {
    lon.is_finite() && (MIN_LON..=MAX_LON).contains(&lon)
}
