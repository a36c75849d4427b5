//! Elevation samples and their provenance.
//!
//! An [`ElevationSample`] is the unit of knowledge passed between the
//! sources, the spatial cache and the resolution cascade. Its fields are
//! private so the provenance tag cannot change after construction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coord::{is_valid_latitude, is_valid_longitude, Coordinate};

/// Lowest elevation considered plausible, in meters.
///
/// The Dead Sea shore sits around -430m.
pub const MIN_PLAUSIBLE_ELEVATION: f64 = -500.0;

/// Highest elevation considered plausible, in meters.
///
/// Everest is 8,849m.
pub const MAX_PLAUSIBLE_ELEVATION: f64 = 9000.0;

/// Accuracy assumed when a source cannot report one, in meters.
pub const DEFAULT_ACCURACY_M: f64 = 50.0;

/// Where an elevation value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElevationSource {
    /// Live altitude reported by the device's location sensor.
    Device,
    /// Replayed from the local spatial cache.
    Cache,
    /// Looked up from a remote elevation service.
    Network,
}

impl ElevationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Cache => "cache",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for ElevationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single elevation observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationSample {
    elevation: f64,
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    source: ElevationSource,
    observed_at: i64,
}

impl ElevationSample {
    /// Creates a sample.
    ///
    /// Negative or non-finite accuracies are replaced by [`DEFAULT_ACCURACY_M`].
    /// Plausibility is not enforced here; check [`is_plausible`](Self::is_plausible)
    /// before surfacing or caching.
    pub fn new(
        source: ElevationSource,
        elevation: f64,
        latitude: f64,
        longitude: f64,
        accuracy: f64,
        observed_at: i64,
    ) -> Self {
        let accuracy = if accuracy.is_finite() && accuracy >= 0.0 {
            accuracy
        } else {
            DEFAULT_ACCURACY_M
        };
        Self {
            elevation,
            latitude,
            longitude,
            accuracy,
            source,
            observed_at,
        }
    }

    /// Creates a sample at a validated coordinate.
    pub fn at(
        source: ElevationSource,
        coord: Coordinate,
        elevation: f64,
        accuracy: f64,
        observed_at: i64,
    ) -> Self {
        Self::new(
            source,
            elevation,
            coord.latitude,
            coord.longitude,
            accuracy,
            observed_at,
        )
    }

    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn source(&self) -> ElevationSource {
        self.source
    }

    /// Acquisition time in epoch milliseconds.
    pub fn observed_at(&self) -> i64 {
        self.observed_at
    }

    /// Age of the observation relative to `now_ms`.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.observed_at
    }

    /// Whether the elevation and coordinates are within physical bounds.
    pub fn is_plausible(&self) -> bool {
        is_plausible(self.elevation, self.latitude, self.longitude)
    }
}

/// Plausibility rule shared by samples and resolutions.
pub fn is_plausible(elevation: f64, latitude: f64, longitude: f64) -> bool {
    elevation.is_finite()
        && (MIN_PLAUSIBLE_ELEVATION..=MAX_PLAUSIBLE_ELEVATION).contains(&elevation)
        && is_valid_latitude(latitude)
        && is_valid_longitude(longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(elevation: f64, lat: f64, lon: f64) -> ElevationSample {
        ElevationSample::new(ElevationSource::Device, elevation, lat, lon, 5.0, 0)
    }

    #[test]
    fn test_plausible_ranges() {
        assert!(sample(1600.0, 39.7, -105.0).is_plausible());
        assert!(sample(-500.0, 31.5, 35.5).is_plausible());
        assert!(sample(9000.0, 27.98, 86.92).is_plausible());
    }

    #[test]
    fn test_implausible_elevation() {
        assert!(!sample(15000.0, 40.0, -105.0).is_plausible());
        assert!(!sample(-501.0, 40.0, -105.0).is_plausible());
        assert!(!sample(f64::NAN, 40.0, -105.0).is_plausible());
    }

    #[test]
    fn test_implausible_coordinates() {
        assert!(!sample(100.0, 91.0, 0.0).is_plausible());
        assert!(!sample(100.0, 0.0, 181.0).is_plausible());
    }

    #[test]
    fn test_invalid_accuracy_falls_back_to_default() {
        let s = ElevationSample::new(ElevationSource::Network, 1.0, 0.0, 0.0, -3.0, 0);
        assert_eq!(s.accuracy(), DEFAULT_ACCURACY_M);
        let s = ElevationSample::new(ElevationSource::Network, 1.0, 0.0, 0.0, f64::NAN, 0);
        assert_eq!(s.accuracy(), DEFAULT_ACCURACY_M);
    }

    #[test]
    fn test_age() {
        let s = ElevationSample::new(ElevationSource::Device, 1.0, 0.0, 0.0, 1.0, 1_000);
        assert_eq!(s.age_ms(4_000), 3_000);
    }

    #[test]
    fn test_source_serializes_lowercase() {
        let json = serde_json::to_string(&ElevationSource::Network).unwrap();
        assert_eq!(json, "\"network\"");
        assert_eq!(ElevationSource::Cache.to_string(), "cache");
    }
}
