//! Fixed-position location provider.
//!
//! Reports a configured position on every request. Used when the user
//! supplies coordinates explicitly (`--lat/--lon`) or the host has no GPS.

use std::sync::Arc;

use super::types::{LocationProvider, PlatformError, PositionFix, PositionRequest};
use crate::clock::{Clock, SystemClock};
use crate::coord::Coordinate;
use crate::BoxFuture;

/// Location provider that always reports the same position.
pub struct FixedLocationProvider {
    position: Coordinate,
    altitude: Option<f64>,
    altitude_accuracy: Option<f64>,
    clock: Arc<dyn Clock>,
}

impl FixedLocationProvider {
    /// Creates a provider reporting `position` without altitude.
    pub fn new(position: Coordinate) -> Self {
        Self {
            position,
            altitude: None,
            altitude_accuracy: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Also report an altitude, optionally with its vertical accuracy.
    pub fn with_altitude(mut self, altitude: f64, accuracy: Option<f64>) -> Self {
        self.altitude = Some(altitude);
        self.altitude_accuracy = accuracy;
        self
    }

    /// Replace the clock used to timestamp fixes.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl LocationProvider for FixedLocationProvider {
    fn current_position(
        &self,
        _request: PositionRequest,
    ) -> BoxFuture<'_, Result<PositionFix, PlatformError>> {
        Box::pin(async move {
            Ok(PositionFix {
                latitude: self.position.latitude,
                longitude: self.position.longitude,
                altitude: self.altitude,
                altitude_accuracy: self.altitude_accuracy,
                timestamp_ms: self.clock.now_ms(),
            })
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
