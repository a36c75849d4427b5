//! The resolution cascade.
//!
//! ```text
//! AcquiringPosition ──err──► Failed (terminal, no sources touched)
//!        │
//!        ▼
//!   TryingDevice ──plausible, accuracy < threshold──► put ──► Resolved(device)
//!        │
//!        ▼
//!  CheckingCache ──hit──► Resolved(cache)
//!        │
//!        ▼
//! QueryingNetwork ──plausible──► put ──► Resolved(network)
//!        │
//!        ▼
//!      Failed (ElevationUnavailable)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::types::{Resolution, ResolveError, ResolveStage, DEFAULT_POSITION_TIMEOUT};
use crate::cache::SpatialCache;
use crate::coord::{is_valid_latitude, is_valid_longitude};
use crate::device::DeviceAltitudeSource;
use crate::location::{LocationProvider, PlatformError, PositionFix, PositionRequest};
use crate::network::NetworkElevationSource;
use crate::sample::DEFAULT_ACCURACY_M;

/// Tunables for the cascade itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeConfig {
    /// Timeout for the coarse position request.
    pub position_timeout: Duration,
    /// Device samples must be strictly more accurate than this, in meters.
    pub accuracy_threshold_m: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            position_timeout: DEFAULT_POSITION_TIMEOUT,
            accuracy_threshold_m: DEFAULT_ACCURACY_M,
        }
    }
}

impl CascadeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position_timeout(mut self, timeout: Duration) -> Self {
        self.position_timeout = timeout;
        self
    }

    pub fn with_accuracy_threshold(mut self, meters: f64) -> Self {
        self.accuracy_threshold_m = meters;
        self
    }
}

/// Resolves the elevation at the current position.
///
/// A `Resolver` holds no per-call state and may be shared across tasks;
/// only the cache persists between calls.
pub struct Resolver {
    location: Arc<dyn LocationProvider>,
    device: DeviceAltitudeSource,
    cache: Arc<SpatialCache>,
    network: NetworkElevationSource,
    config: CascadeConfig,
}

impl Resolver {
    /// Creates a resolver whose device source reads from `location`.
    pub fn new(
        location: Arc<dyn LocationProvider>,
        cache: Arc<SpatialCache>,
        network: NetworkElevationSource,
    ) -> Self {
        Self {
            device: DeviceAltitudeSource::new(Arc::clone(&location)),
            location,
            cache,
            network,
            config: CascadeConfig::default(),
        }
    }

    /// Replace the device altitude source.
    pub fn with_device(mut self, device: DeviceAltitudeSource) -> Self {
        self.device = device;
        self
    }

    pub fn with_config(mut self, config: CascadeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache(&self) -> &Arc<SpatialCache> {
        &self.cache
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Runs the cascade once.
    pub async fn resolve(&self) -> Result<Resolution, ResolveError> {
        self.run(&|_: ResolveStage, _: &str| {}).await
    }

    /// Runs the cascade once, reporting each stage to `progress`.
    ///
    /// Takes exactly the same decisions as [`Resolver::resolve`].
    pub async fn resolve_with_progress<F>(&self, progress: F) -> Result<Resolution, ResolveError>
    where
        F: Fn(ResolveStage, &str) + Send + Sync,
    {
        self.run(&progress).await
    }

    #[instrument(name = "resolve", skip_all)]
    async fn run(
        &self,
        progress: &(dyn Fn(ResolveStage, &str) + Send + Sync),
    ) -> Result<Resolution, ResolveError> {
        progress(ResolveStage::AcquiringPosition, "Requesting location...");
        let position = match self.acquire_position().await {
            Ok(position) => position,
            Err(e) => {
                let err = ResolveError::from(e);
                warn!(kind = %err.kind, error = %err.message, "Position acquisition failed");
                progress(ResolveStage::Failed, &err.message);
                return Err(err);
            }
        };
        let (lat, lon) = (position.latitude, position.longitude);
        debug!(lat, lon, provider = self.location.name(), "Position acquired");

        progress(
            ResolveStage::TryingDevice,
            "Location acquired. Detecting elevation...",
        );
        if let Some(sample) = self.device.sample().await {
            if sample.is_plausible() && sample.accuracy() < self.config.accuracy_threshold_m {
                progress(ResolveStage::Resolved, "Device altitude detected");
                self.cache.put(sample.clone()).await;
                return Ok(self.finish(Resolution::from_sample(&sample)));
            }
            debug!(
                elevation = sample.elevation(),
                accuracy = sample.accuracy(),
                threshold = self.config.accuracy_threshold_m,
                "Device altitude rejected"
            );
        }

        progress(ResolveStage::CheckingCache, "Checking cached data...");
        if let Some(sample) = self.cache.get(lat, lon).await {
            progress(ResolveStage::Resolved, "Using cached elevation data");
            return Ok(self.finish(Resolution::from_cached(&sample)));
        }

        progress(
            ResolveStage::QueryingNetwork,
            "Fetching elevation from network...",
        );
        if let Some(sample) = self.network.fetch(lat, lon).await {
            if sample.is_plausible() {
                progress(ResolveStage::Resolved, "Elevation retrieved from network");
                self.cache.put(sample.clone()).await;
                return Ok(self.finish(Resolution::from_sample(&sample)));
            }
            warn!(
                elevation = sample.elevation(),
                provider = self.network.provider_name(),
                "Network returned an implausible elevation"
            );
        }

        let err = ResolveError::elevation_unavailable();
        warn!(lat, lon, "Unable to determine elevation");
        progress(ResolveStage::Failed, "Unable to determine elevation");
        Err(err)
    }

    async fn acquire_position(&self) -> Result<PositionFix, PlatformError> {
        let timeout = self.config.position_timeout;
        let request = PositionRequest::coarse(timeout);
        let fix = tokio::time::timeout(timeout, self.location.current_position(request))
            .await
            .map_err(|_| PlatformError::Timeout)??;

        if !is_valid_latitude(fix.latitude) || !is_valid_longitude(fix.longitude) {
            return Err(PlatformError::PositionUnavailable(format!(
                "invalid coordinates ({}, {})",
                fix.latitude, fix.longitude
            )));
        }
        Ok(fix)
    }

    fn finish(&self, resolution: Resolution) -> Resolution {
        info!(
            source = %resolution.source,
            elevation = resolution.elevation,
            accuracy = resolution.accuracy,
            "Elevation resolved"
        );
        resolution
    }
}
