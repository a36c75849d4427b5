//! Cascade result and failure types.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::location::PlatformError;
use crate::sample::{self, ElevationSample, ElevationSource, DEFAULT_ACCURACY_M};

/// Default timeout for acquiring the coarse position.
pub const DEFAULT_POSITION_TIMEOUT: Duration = Duration::from_secs(15);

/// Stages of a resolution, in the order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveStage {
    /// Asking the platform for the current coordinates.
    AcquiringPosition,
    /// Reading live altitude from the device.
    TryingDevice,
    /// Looking up the spatial cache.
    CheckingCache,
    /// Asking the network elevation service.
    QueryingNetwork,
    /// An elevation was found.
    Resolved,
    /// No elevation could be determined.
    Failed,
}

impl ResolveStage {
    /// Get a human-readable name for the stage.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AcquiringPosition => "Acquiring position",
            Self::TryingDevice => "Trying device",
            Self::CheckingCache => "Checking cache",
            Self::QueryingNetwork => "Querying network",
            Self::Resolved => "Resolved",
            Self::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Failed)
    }
}

/// Why a resolution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    NotSupported,
    ElevationUnavailable,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::PositionUnavailable => "position_unavailable",
            Self::Timeout => "timeout",
            Self::NotSupported => "not_supported",
            Self::ElevationUnavailable => "elevation_unavailable",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed resolution.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{message}")]
pub struct ResolveError {
    pub kind: FailureKind,
    pub message: String,
}

impl ResolveError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn elevation_unavailable() -> Self {
        Self::new(
            FailureKind::ElevationUnavailable,
            "Unable to determine elevation. Check your network connection and try again.",
        )
    }
}

impl From<PlatformError> for ResolveError {
    fn from(err: PlatformError) -> Self {
        let (kind, hint) = match &err {
            PlatformError::PermissionDenied(_) => (
                FailureKind::PermissionDenied,
                "Enable location access for this program.",
            ),
            PlatformError::PositionUnavailable(_) => (
                FailureKind::PositionUnavailable,
                "Check that your location device is connected.",
            ),
            PlatformError::Timeout => (FailureKind::Timeout, "Please try again."),
            PlatformError::NotSupported(_) => (
                FailureKind::NotSupported,
                "Configure a fixed location or start a location service.",
            ),
        };
        Self::new(kind, format!("{}. {}", err, hint))
    }
}

/// A resolved elevation with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// Elevation in meters.
    pub elevation: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy in meters.
    pub accuracy: f64,
    pub source: ElevationSource,
    /// When the elevation was observed, epoch milliseconds.
    pub observed_at: i64,
    pub served_from_cache: bool,
}

impl Resolution {
    /// Builds a fresh resolution reporting the sample's own source.
    pub fn from_sample(sample: &ElevationSample) -> Self {
        Self {
            elevation: sample.elevation(),
            latitude: sample.latitude(),
            longitude: sample.longitude(),
            accuracy: sample.accuracy(),
            source: sample.source(),
            observed_at: sample.observed_at(),
            served_from_cache: false,
        }
    }

    /// Builds a resolution for a cache hit, keeping the stored observation
    /// time and accuracy.
    pub fn from_cached(sample: &ElevationSample) -> Self {
        Self {
            source: ElevationSource::Cache,
            served_from_cache: true,
            ..Self::from_sample(sample)
        }
    }

    /// Elevation within [-500, 9000] m, coordinates in range, accuracy
    /// non-negative.
    pub fn is_plausible(&self) -> bool {
        sample::is_plausible(self.elevation, self.latitude, self.longitude)
            && self.accuracy.is_finite()
            && self.accuracy >= 0.0
    }

    /// Whether the accuracy is the "unknown" sentinel.
    pub fn has_default_accuracy(&self) -> bool {
        self.accuracy == DEFAULT_ACCURACY_M
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_error_maps_one_to_one() {
        let cases = [
            (
                PlatformError::PermissionDenied("denied".into()),
                FailureKind::PermissionDenied,
            ),
            (
                PlatformError::PositionUnavailable("no fix".into()),
                FailureKind::PositionUnavailable,
            ),
            (PlatformError::Timeout, FailureKind::Timeout),
            (
                PlatformError::NotSupported("no gpsd".into()),
                FailureKind::NotSupported,
            ),
        ];
        for (platform, kind) in cases {
            let err = ResolveError::from(platform);
            assert_eq!(err.kind, kind);
            assert!(!err.message.is_empty());
        }
    }

    #[test]
    fn test_cached_resolution_keeps_observation() {
        let sample = ElevationSample::new(ElevationSource::Device, 1600.0, 40.0, -105.0, 8.0, 42);
        let resolution = Resolution::from_cached(&sample);

        assert_eq!(resolution.source, ElevationSource::Cache);
        assert!(resolution.served_from_cache);
        assert_eq!(resolution.observed_at, 42);
        assert_eq!(resolution.accuracy, 8.0);
    }

    #[test]
    fn test_resolution_plausibility() {
        let sample = ElevationSample::new(ElevationSource::Network, 210.0, 38.6, -90.2, 10.0, 0);
        let mut resolution = Resolution::from_sample(&sample);
        assert!(resolution.is_plausible());
        assert!(!resolution.served_from_cache);

        resolution.elevation = 9_500.0;
        assert!(!resolution.is_plausible());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(ResolveStage::CheckingCache.name(), "Checking cache");
        assert!(ResolveStage::Failed.is_terminal());
        assert!(!ResolveStage::TryingDevice.is_terminal());
        assert_eq!(FailureKind::ElevationUnavailable.to_string(), "elevation_unavailable");
    }
}
