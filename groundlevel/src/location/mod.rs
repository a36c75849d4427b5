//! Platform location capability.
//!
//! The [`LocationProvider`] trait is the seam between the elevation cascade
//! and whatever reports the device's position. Two implementations ship:
//!
//! - [`GpsdLocationProvider`]: a local gpsd daemon (live GPS, with altitude)
//! - [`FixedLocationProvider`]: a configured position
//!
//! Both the coarse position acquisition and the device altitude source go
//! through the same provider with different [`PositionRequest`]s.

mod fixed;
mod gpsd;
mod types;

pub use fixed::FixedLocationProvider;
pub use gpsd::{GpsdLocationProvider, DEFAULT_GPSD_HOST, DEFAULT_GPSD_PORT};
pub use types::{LocationProvider, PlatformError, PositionFix, PositionRequest};

#[cfg(test)]
pub use tests::MockLocationProvider;

#[cfg(test)]
pub mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::BoxFuture;

    /// Mock location provider with separate outcomes for coarse and
    /// high-accuracy requests.
    pub struct MockLocationProvider {
        pub coarse: Result<PositionFix, PlatformError>,
        pub high_accuracy: Result<PositionFix, PlatformError>,
        pub calls: AtomicUsize,
    }

    impl MockLocationProvider {
        pub fn new(
            coarse: Result<PositionFix, PlatformError>,
            high_accuracy: Result<PositionFix, PlatformError>,
        ) -> Self {
            Self {
                coarse,
                high_accuracy,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LocationProvider for MockLocationProvider {
        fn current_position(
            &self,
            request: PositionRequest,
        ) -> BoxFuture<'_, Result<PositionFix, PlatformError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = if request.high_accuracy {
                self.high_accuracy.clone()
            } else {
                self.coarse.clone()
            };
            Box::pin(async move { outcome })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    /// A fix at (lat, lon) without altitude.
    pub fn fix(lat: f64, lon: f64) -> PositionFix {
        PositionFix {
            latitude: lat,
            longitude: lon,
            altitude: None,
            altitude_accuracy: None,
            timestamp_ms: 0,
        }
    }
}
