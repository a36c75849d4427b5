//! Application bootstrap implementation.
//!
//! `ElevationApp` opens the elevation store exactly once, wires the sources
//! around it and closes it again on shutdown. Everything that needs the
//! cache goes through the instances it hands out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::config::{AppConfig, LocationMode, NetworkConfig};
use super::error::AppError;
use crate::cache::SpatialCache;
use crate::cascade::Resolver;
use crate::coord::Coordinate;
use crate::device::DeviceAltitudeSource;
use crate::location::{FixedLocationProvider, GpsdLocationProvider, LocationProvider};
use crate::network::{
    ElevationProvider, FallbackProvider, NetworkElevationSource, OpenMeteoProvider, ReqwestClient,
    UsgsProvider,
};
use crate::store::{ElevationStore, FileStore, MemoryStore};

/// Groundlevel application with store lifecycle management.
///
/// # Example
///
/// ```ignore
/// let app = ElevationApp::start(AppConfig::new(None)).await?;
/// let resolution = app.resolver().resolve().await?;
/// app.shutdown().await?;
/// ```
pub struct ElevationApp {
    store: Arc<dyn ElevationStore>,
    cache: Arc<SpatialCache>,
    resolver: Arc<Resolver>,
    config: AppConfig,
}

impl ElevationApp {
    /// Start the application with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened, the HTTP client
    /// cannot be built or the location settings are invalid.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        let store = Self::open_store(&config)?;
        info!(
            entries = store.len(),
            path = ?config.cache_path,
            "Elevation store opened"
        );

        let cache = Arc::new(SpatialCache::new(Arc::clone(&store), config.cache.clone()));

        let location = Self::create_location(&config.location.mode)?;
        let device = DeviceAltitudeSource::new(Arc::clone(&location))
            .with_timeout(config.location.device_timeout);
        let (provider, budget) = Self::create_provider(&config.network)?;
        let network = NetworkElevationSource::new(provider).with_timeout(budget);

        info!(
            location = location.name(),
            provider = network.provider_name(),
            "Elevation sources ready"
        );

        let resolver = Arc::new(
            Resolver::new(location, Arc::clone(&cache), network)
                .with_device(device)
                .with_config(config.cascade.clone()),
        );

        Ok(Self {
            store,
            cache,
            resolver,
            config,
        })
    }

    fn open_store(config: &AppConfig) -> Result<Arc<dyn ElevationStore>, AppError> {
        let store: Arc<dyn ElevationStore> = match &config.cache_path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(store)
    }

    fn create_location(mode: &LocationMode) -> Result<Arc<dyn LocationProvider>, AppError> {
        let provider: Arc<dyn LocationProvider> = match mode {
            LocationMode::Gpsd { host, port } => {
                Arc::new(GpsdLocationProvider::new(host.clone(), *port))
            }
            LocationMode::Fixed {
                latitude,
                longitude,
                altitude,
                altitude_accuracy,
            } => {
                let position = Coordinate::new(*latitude, *longitude)
                    .map_err(|e| AppError::Config(e.to_string()))?;
                let mut fixed = FixedLocationProvider::new(position);
                if let Some(alt) = altitude {
                    fixed = fixed.with_altitude(*alt, *altitude_accuracy);
                }
                Arc::new(fixed)
            }
        };
        Ok(provider)
    }

    /// Builds the configured provider and the total time one lookup may take.
    ///
    /// In a chain every provider gets the full per-request timeout, so the
    /// lookup budget is the sum of the attempts.
    fn create_provider(
        config: &NetworkConfig,
    ) -> Result<(Arc<dyn ElevationProvider>, Duration), AppError> {
        use crate::config::ProviderKind;

        let client = ReqwestClient::with_timeout(config.timeout)?;
        let open_meteo: Arc<dyn ElevationProvider> = Arc::new(OpenMeteoProvider::with_base_url(
            client.clone(),
            config.open_meteo_url.clone(),
        ));
        let usgs: Arc<dyn ElevationProvider> = Arc::new(UsgsProvider::with_base_url(
            client,
            config.usgs_url.clone(),
        ));

        Ok(match config.provider {
            ProviderKind::OpenMeteo => (open_meteo, config.timeout),
            ProviderKind::Usgs => (usgs, config.timeout),
            ProviderKind::Chain => {
                let chain = FallbackProvider::new(vec![open_meteo, usgs])
                    .with_attempt_timeout(config.timeout);
                let budget = chain.total_budget().unwrap_or(config.timeout);
                (Arc::new(chain), budget)
            }
        })
    }

    /// Get the resolver.
    pub fn resolver(&self) -> Arc<Resolver> {
        Arc::clone(&self.resolver)
    }

    /// Get the spatial cache for maintenance commands.
    pub fn cache(&self) -> Arc<SpatialCache> {
        Arc::clone(&self.cache)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Flush and close the store.
    pub async fn shutdown(self) -> Result<(), AppError> {
        info!("Shutting down groundlevel");
        if let Err(e) = self.store.close().await {
            warn!(error = %e, "Failed to close elevation store");
            return Err(e.into());
        }
        Ok(())
    }
}
