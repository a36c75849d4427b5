//! Network elevation source.
//!
//! Wraps an [`ElevationProvider`] with the cascade's contract: one request,
//! a hard timeout, and a definite `Option` outcome. Remote services do not
//! report accuracy, so every sample carries a fixed estimate.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::types::{ElevationProvider, ProviderError};
use crate::clock::{Clock, SystemClock};
use crate::sample::{ElevationSample, ElevationSource};

/// Default timeout for a network elevation lookup.
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(5);

/// Accuracy assigned to network elevations, in meters.
pub const NETWORK_ACCURACY_M: f64 = 10.0;

/// Fetches elevations from a remote service.
pub struct NetworkElevationSource {
    provider: Arc<dyn ElevationProvider>,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl NetworkElevationSource {
    pub fn new(provider: Arc<dyn ElevationProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_NETWORK_TIMEOUT,
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the clock used to stamp samples.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Looks up the elevation at a coordinate, or `None` on any failure.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn fetch(&self, lat: f64, lon: f64) -> Option<ElevationSample> {
        let outcome = match tokio::time::timeout(self.timeout, self.provider.elevation(lat, lon))
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderError::Timeout),
        };

        match outcome {
            Ok(elevation) if elevation.is_finite() => {
                debug!(elevation, "Network elevation result");
                Some(ElevationSample::new(
                    ElevationSource::Network,
                    elevation,
                    lat,
                    lon,
                    NETWORK_ACCURACY_M,
                    self.clock.now_ms(),
                ))
            }
            Ok(elevation) => {
                warn!(elevation, "Network returned a non-finite elevation");
                None
            }
            Err(ProviderError::Timeout) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Network request timed out");
                None
            }
            Err(e) => {
                warn!(error = %e, "Network elevation request failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::network::{MockHttpClient, OpenMeteoProvider};
    use crate::BoxFuture;

    fn source(body: &str) -> NetworkElevationSource {
        NetworkElevationSource::new(Arc::new(OpenMeteoProvider::new(MockHttpClient::ok(body))))
            .with_clock(Arc::new(ManualClock::new(5_000)))
    }

    #[tokio::test]
    async fn test_success_has_fixed_accuracy() {
        let sample = source(r#"{"elevation":[210.0]}"#)
            .fetch(38.6, -90.2)
            .await
            .unwrap();
        assert_eq!(sample.elevation(), 210.0);
        assert_eq!(sample.accuracy(), NETWORK_ACCURACY_M);
        assert_eq!(sample.source(), ElevationSource::Network);
        assert_eq!(sample.observed_at(), 5_000);
        assert_eq!(sample.latitude(), 38.6);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_unavailable() {
        assert!(source("{").fetch(0.0, 0.0).await.is_none());
    }

    struct SlowProvider;

    impl ElevationProvider for SlowProvider {
        fn elevation(&self, _lat: f64, _lon: f64) -> BoxFuture<'_, Result<f64, ProviderError>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(1.0)
            })
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_unavailable() {
        let source = NetworkElevationSource::new(Arc::new(SlowProvider));
        assert_eq!(source.timeout, DEFAULT_NETWORK_TIMEOUT);
        assert!(source.fetch(0.0, 0.0).await.is_none());
    }
}
