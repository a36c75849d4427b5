//! Application configuration for [`super::ElevationApp`].
//!
//! `AppConfig` gathers the runtime settings of every component. It is built
//! from a [`ConfigFile`] in one place, [`AppConfig::from_config_file`], so
//! the CLI never translates individual settings itself.

use std::path::PathBuf;
use std::time::Duration;

use super::error::AppError;
use crate::cache::{CacheConfig, SweepPolicy};
use crate::cascade::CascadeConfig;
use crate::config::{default_cache_path, ConfigFile, LocationSourceKind, ProviderKind};
use crate::device::DEFAULT_DEVICE_TIMEOUT;
use crate::location::{DEFAULT_GPSD_HOST, DEFAULT_GPSD_PORT};
use crate::network::{DEFAULT_NETWORK_TIMEOUT, OPEN_METEO_URL, USGS_EPQS_URL};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

fn days(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(SECS_PER_DAY))
}

/// Where positions come from.
#[derive(Clone, Debug, PartialEq)]
pub enum LocationMode {
    /// Query a gpsd daemon.
    Gpsd { host: String, port: u16 },
    /// Always report the same position.
    Fixed {
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
        altitude_accuracy: Option<f64>,
    },
}

/// Location capability configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationConfig {
    pub mode: LocationMode,
    /// Timeout for the high-accuracy device altitude fix.
    pub device_timeout: Duration,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            mode: LocationMode::Gpsd {
                host: DEFAULT_GPSD_HOST.to_string(),
                port: DEFAULT_GPSD_PORT,
            },
            device_timeout: DEFAULT_DEVICE_TIMEOUT,
        }
    }
}

impl LocationConfig {
    /// A fixed position without altitude.
    pub fn fixed(latitude: f64, longitude: f64) -> Self {
        Self {
            mode: LocationMode::Fixed {
                latitude,
                longitude,
                altitude: None,
                altitude_accuracy: None,
            },
            ..Self::default()
        }
    }

    /// Attach a device altitude to a fixed position. No effect for gpsd.
    pub fn with_altitude(mut self, altitude: f64, accuracy: Option<f64>) -> Self {
        if let LocationMode::Fixed {
            altitude: alt,
            altitude_accuracy,
            ..
        } = &mut self.mode
        {
            *alt = Some(altitude);
            *altitude_accuracy = accuracy;
        }
        self
    }

    pub fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout = timeout;
        self
    }
}

/// Network elevation service configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkConfig {
    pub provider: ProviderKind,
    pub open_meteo_url: String,
    pub usgs_url: String,
    pub timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            open_meteo_url: OPEN_METEO_URL.to_string(),
            usgs_url: USGS_EPQS_URL.to_string(),
            timeout: DEFAULT_NETWORK_TIMEOUT,
        }
    }
}

impl NetworkConfig {
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Application configuration combining all component configs.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub location: LocationConfig,
    pub network: NetworkConfig,
    pub cache: CacheConfig,
    /// Snapshot file for the cache. `None` keeps the cache in memory only.
    pub cache_path: Option<PathBuf>,
    pub cascade: CascadeConfig,
}

impl AppConfig {
    /// Defaults with the cache stored at `cache_path`.
    pub fn new(cache_path: Option<PathBuf>) -> Self {
        Self {
            location: LocationConfig::default(),
            network: NetworkConfig::default(),
            cache: CacheConfig::default(),
            cache_path,
            cascade: CascadeConfig::default(),
        }
    }

    /// Create application config from the configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Result<Self, AppError> {
        let loc = &config.location;
        let mode = match loc.source {
            LocationSourceKind::Gpsd => LocationMode::Gpsd {
                host: loc.gpsd_host.clone(),
                port: loc.gpsd_port,
            },
            LocationSourceKind::Fixed => match (loc.latitude, loc.longitude) {
                (Some(latitude), Some(longitude)) => LocationMode::Fixed {
                    latitude,
                    longitude,
                    altitude: loc.altitude,
                    altitude_accuracy: loc.altitude_accuracy,
                },
                _ => {
                    return Err(AppError::Config(
                        "location.source = fixed requires latitude and longitude".to_string(),
                    ))
                }
            },
        };

        let cache_path = match &config.cache.path {
            Some(path) => path.clone(),
            None => default_cache_path().map_err(|e| AppError::Config(e.to_string()))?,
        };

        Ok(Self {
            location: LocationConfig {
                mode,
                device_timeout: Duration::from_secs(loc.device_timeout_secs),
            },
            network: NetworkConfig {
                provider: config.network.provider,
                open_meteo_url: config.network.open_meteo_url.clone(),
                usgs_url: config.network.usgs_url.clone(),
                timeout: Duration::from_secs(config.network.timeout_secs),
            },
            cache: CacheConfig::default()
                .with_validity(days(config.cache.validity_days))
                .with_retention(days(config.cache.retention_days))
                .with_tolerance(config.cache.tolerance_degrees)
                .with_sweep_policy(SweepPolicy::one_in(config.cache.sweep_one_in)),
            cache_path: Some(cache_path),
            cascade: CascadeConfig::default()
                .with_position_timeout(Duration::from_secs(loc.position_timeout_secs))
                .with_accuracy_threshold(config.cascade.accuracy_threshold_m),
        })
    }

    pub fn with_location(mut self, location: LocationConfig) -> Self {
        self.location = location;
        self
    }

    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_cache_path(mut self, cache_path: Option<PathBuf>) -> Self {
        self.cache_path = cache_path;
        self
    }

    pub fn with_cascade(mut self, cascade: CascadeConfig) -> Self {
        self.cascade = cascade;
        self
    }
}
