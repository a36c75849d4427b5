//! Configuration file handling.
//!
//! Settings live in `~/.groundlevel/config.ini`:
//!
//! ```ini
//! [location]
//! source = gpsd
//!
//! [network]
//! provider = open-meteo
//!
//! [cache]
//! validity_days = 7
//! retention_days = 30
//! ```
//!
//! [`ConfigFile`] is the on-disk shape; [`crate::app::AppConfig`] turns it
//! into the runtime configuration of each component.

mod file;
mod keys;
mod paths;

pub use file::{
    CacheSettings, CascadeSettings, ConfigError, ConfigFile, LandmarkSettings, LocationSettings,
    LocationSourceKind, LoggingSettings, NetworkSettings, ProviderKind, MAX_CACHE_DAYS,
};
pub use keys::ConfigKey;
pub use paths::{config_dir, config_file_path, default_cache_path};
