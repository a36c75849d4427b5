//! Device altitude source.
//!
//! Requests one fresh, high-accuracy fix from the location capability and
//! turns its altitude into an [`ElevationSample`]. Every failure mode
//! (no capability, no altitude in the fix, error, timeout) collapses into
//! `None`; the caller always gets a definite answer within the timeout.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::location::{LocationProvider, PlatformError, PositionRequest};
use crate::sample::{ElevationSample, ElevationSource, DEFAULT_ACCURACY_M};

/// Default timeout for the device altitude fix.
pub const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads live altitude from the device's location sensor.
pub struct DeviceAltitudeSource {
    location: Arc<dyn LocationProvider>,
    timeout: Duration,
}

impl DeviceAltitudeSource {
    pub fn new(location: Arc<dyn LocationProvider>) -> Self {
        Self {
            location,
            timeout: DEFAULT_DEVICE_TIMEOUT,
        }
    }

    /// Set the fix timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Takes one altitude sample, or `None` if the device cannot provide one.
    pub async fn sample(&self) -> Option<ElevationSample> {
        let request = PositionRequest::high_accuracy(self.timeout);
        let outcome =
            match tokio::time::timeout(self.timeout, self.location.current_position(request)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(PlatformError::Timeout),
            };

        let fix = match outcome {
            Ok(fix) => fix,
            Err(e) => {
                warn!(provider = self.location.name(), error = %e, "Device position error");
                return None;
            }
        };

        let Some(altitude) = fix.altitude else {
            debug!(provider = self.location.name(), "Device fix has no altitude");
            return None;
        };

        // A missing or zero vertical accuracy means the device did not report one.
        let accuracy = fix
            .altitude_accuracy
            .filter(|a| a.is_finite() && *a > 0.0)
            .unwrap_or(DEFAULT_ACCURACY_M);

        Some(ElevationSample::new(
            ElevationSource::Device,
            altitude,
            fix.latitude,
            fix.longitude,
            accuracy,
            fix.timestamp_ms,
        ))
    }
}
