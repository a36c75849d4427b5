//! The `config.ini` file.
//!
//! Every setting has a default, so a missing file or a missing key is never
//! an error. Values that are present but malformed are rejected with a
//! [`ConfigError::InvalidValue`] naming the offending key.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use thiserror::Error;

use super::paths::config_file_path;
use crate::cache::{DEFAULT_SWEEP_ONE_IN, DEFAULT_TOLERANCE_DEGREES};
use crate::coord::{is_valid_latitude, is_valid_longitude};
use crate::location::{DEFAULT_GPSD_HOST, DEFAULT_GPSD_PORT};
use crate::network::{OPEN_METEO_URL, USGS_EPQS_URL};
use crate::sample::DEFAULT_ACCURACY_M;

/// Largest accepted `validity_days` / `retention_days` (about 100 years).
pub const MAX_CACHE_DAYS: u64 = 36_500;

/// Errors reading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {section}.{key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Could not determine home directory")]
    NoHomeDir,
}

impl From<ini::Error> for ConfigError {
    fn from(err: ini::Error) -> Self {
        match err {
            ini::Error::Io(e) => ConfigError::Io(e),
            ini::Error::Parse(e) => ConfigError::Parse(e.to_string()),
        }
    }
}

/// Where the coarse position and device altitude come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationSourceKind {
    /// A local gpsd daemon.
    #[default]
    Gpsd,
    /// The configured latitude/longitude.
    Fixed,
}

impl LocationSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpsd => "gpsd",
            Self::Fixed => "fixed",
        }
    }
}

impl FromStr for LocationSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gpsd" => Ok(Self::Gpsd),
            "fixed" => Ok(Self::Fixed),
            _ => Err("expected 'gpsd' or 'fixed'".to_string()),
        }
    }
}

impl fmt::Display for LocationSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which network elevation service to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    OpenMeteo,
    Usgs,
    /// Open-Meteo first, then USGS.
    Chain,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenMeteo => "open-meteo",
            Self::Usgs => "usgs",
            Self::Chain => "chain",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open-meteo" | "openmeteo" => Ok(Self::OpenMeteo),
            "usgs" => Ok(Self::Usgs),
            "chain" => Ok(Self::Chain),
            _ => Err("expected 'open-meteo', 'usgs' or 'chain'".to_string()),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[location]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSettings {
    pub source: LocationSourceKind,
    pub gpsd_host: String,
    pub gpsd_port: u16,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub altitude_accuracy: Option<f64>,
    pub position_timeout_secs: u64,
    pub device_timeout_secs: u64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            source: LocationSourceKind::default(),
            gpsd_host: DEFAULT_GPSD_HOST.to_string(),
            gpsd_port: DEFAULT_GPSD_PORT,
            latitude: None,
            longitude: None,
            altitude: None,
            altitude_accuracy: None,
            position_timeout_secs: 15,
            device_timeout_secs: 10,
        }
    }
}

/// `[network]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSettings {
    pub provider: ProviderKind,
    pub open_meteo_url: String,
    pub usgs_url: String,
    pub timeout_secs: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            open_meteo_url: OPEN_METEO_URL.to_string(),
            usgs_url: USGS_EPQS_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Snapshot file. `None` means the default under the config directory.
    pub path: Option<PathBuf>,
    pub validity_days: u64,
    pub retention_days: u64,
    pub tolerance_degrees: f64,
    /// Odds of a sweep per write; 0 disables automatic sweeps.
    pub sweep_one_in: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: None,
            validity_days: 7,
            retention_days: 30,
            tolerance_degrees: DEFAULT_TOLERANCE_DEGREES,
            sweep_one_in: DEFAULT_SWEEP_ONE_IN,
        }
    }
}

/// `[cascade]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeSettings {
    pub accuracy_threshold_m: f64,
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self {
            accuracy_threshold_m: DEFAULT_ACCURACY_M,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// `[landmarks]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSettings {
    /// Extra landmarks (JSON) appended to the built-in catalogue.
    pub file: Option<PathBuf>,
}

/// Parsed `config.ini`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub location: LocationSettings,
    pub network: NetworkSettings,
    pub cache: CacheSettings,
    pub cascade: CascadeSettings,
    pub logging: LoggingSettings,
    pub landmarks: LandmarkSettings,
}

impl ConfigFile {
    /// Load from the default location, `~/.groundlevel/config.ini`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path()?)
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_ini(&Ini::load_from_file(path)?)
    }

    /// Parse from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path()?)
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        Ok(())
    }

    /// Renders the full configuration as INI text.
    pub fn to_ini_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.to_ini().write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub(crate) fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(s) = ini.section(Some("location")) {
            let loc = &mut config.location;
            if let Some(v) = value::<LocationSourceKind>(s, "location", "source")? {
                loc.source = v;
            }
            if let Some(v) = s.get("gpsd_host").map(str::trim).filter(|v| !v.is_empty()) {
                loc.gpsd_host = v.to_string();
            }
            set(&mut loc.gpsd_port, value(s, "location", "gpsd_port")?);
            loc.latitude = value(s, "location", "latitude")?;
            loc.longitude = value(s, "location", "longitude")?;
            loc.altitude = value(s, "location", "altitude")?;
            loc.altitude_accuracy = value(s, "location", "altitude_accuracy")?;
            set(
                &mut loc.position_timeout_secs,
                value(s, "location", "position_timeout_secs")?,
            );
            set(
                &mut loc.device_timeout_secs,
                value(s, "location", "device_timeout_secs")?,
            );
        }

        if let Some(s) = ini.section(Some("network")) {
            let net = &mut config.network;
            set(&mut net.provider, value(s, "network", "provider")?);
            set(&mut net.open_meteo_url, value(s, "network", "open_meteo_url")?);
            set(&mut net.usgs_url, value(s, "network", "usgs_url")?);
            set(&mut net.timeout_secs, value(s, "network", "timeout_secs")?);
        }

        if let Some(s) = ini.section(Some("cache")) {
            let cache = &mut config.cache;
            cache.path = path_value(s, "path");
            set(&mut cache.validity_days, value(s, "cache", "validity_days")?);
            set(&mut cache.retention_days, value(s, "cache", "retention_days")?);
            set(
                &mut cache.tolerance_degrees,
                value(s, "cache", "tolerance_degrees")?,
            );
            set(&mut cache.sweep_one_in, value(s, "cache", "sweep_one_in")?);
        }

        if let Some(s) = ini.section(Some("cascade")) {
            set(
                &mut config.cascade.accuracy_threshold_m,
                value(s, "cascade", "accuracy_threshold_m")?,
            );
        }

        if let Some(s) = ini.section(Some("logging")) {
            set(&mut config.logging.level, value(s, "logging", "level")?);
            config.logging.file = path_value(s, "file");
        }

        if let Some(s) = ini.section(Some("landmarks")) {
            config.landmarks.file = path_value(s, "file");
        }

        config.validate()?;
        Ok(config)
    }

    pub(crate) fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        let loc = &self.location;
        ini.with_section(Some("location"))
            .set("source", loc.source.as_str())
            .set("gpsd_host", loc.gpsd_host.as_str())
            .set("gpsd_port", loc.gpsd_port.to_string())
            .set("latitude", opt(loc.latitude))
            .set("longitude", opt(loc.longitude))
            .set("altitude", opt(loc.altitude))
            .set("altitude_accuracy", opt(loc.altitude_accuracy))
            .set("position_timeout_secs", loc.position_timeout_secs.to_string())
            .set("device_timeout_secs", loc.device_timeout_secs.to_string());

        let net = &self.network;
        ini.with_section(Some("network"))
            .set("provider", net.provider.as_str())
            .set("open_meteo_url", net.open_meteo_url.as_str())
            .set("usgs_url", net.usgs_url.as_str())
            .set("timeout_secs", net.timeout_secs.to_string());

        let cache = &self.cache;
        ini.with_section(Some("cache"))
            .set("path", opt_path(&cache.path))
            .set("validity_days", cache.validity_days.to_string())
            .set("retention_days", cache.retention_days.to_string())
            .set("tolerance_degrees", cache.tolerance_degrees.to_string())
            .set("sweep_one_in", cache.sweep_one_in.to_string());

        ini.with_section(Some("cascade")).set(
            "accuracy_threshold_m",
            self.cascade.accuracy_threshold_m.to_string(),
        );

        ini.with_section(Some("logging"))
            .set("level", self.logging.level.as_str())
            .set("file", opt_path(&self.logging.file));

        ini.with_section(Some("landmarks"))
            .set("file", opt_path(&self.landmarks.file));

        ini
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let loc = &self.location;
        if let Some(lat) = loc.latitude {
            if !is_valid_latitude(lat) {
                return Err(invalid("location", "latitude", lat, "must be within [-90, 90]"));
            }
        }
        if let Some(lon) = loc.longitude {
            if !is_valid_longitude(lon) {
                return Err(invalid("location", "longitude", lon, "must be within [-180, 180]"));
            }
        }
        if loc.source == LocationSourceKind::Fixed
            && (loc.latitude.is_none() || loc.longitude.is_none())
        {
            return Err(invalid(
                "location",
                "source",
                "fixed",
                "requires latitude and longitude",
            ));
        }

        let tolerance = self.cache.tolerance_degrees;
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(invalid("cache", "tolerance_degrees", tolerance, "must be positive"));
        }
        for (key, days) in [
            ("validity_days", self.cache.validity_days),
            ("retention_days", self.cache.retention_days),
        ] {
            if days > MAX_CACHE_DAYS {
                return Err(invalid("cache", key, days, "must be at most 36500"));
            }
        }
        if self.cache.retention_days < self.cache.validity_days {
            return Err(invalid(
                "cache",
                "retention_days",
                self.cache.retention_days,
                "must not be shorter than validity_days",
            ));
        }

        let threshold = self.cascade.accuracy_threshold_m;
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(invalid(
                "cascade",
                "accuracy_threshold_m",
                threshold,
                "must be positive",
            ));
        }
        Ok(())
    }
}

fn value<T>(props: &Properties, section: &str, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match props.get(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| invalid(section, key, raw, e)),
    }
}

fn set<T>(target: &mut T, parsed: Option<T>) {
    if let Some(v) = parsed {
        *target = v;
    }
}

/// Reads a path, expanding a leading `~/` to the home directory.
fn path_value(props: &Properties, key: &str) -> Option<PathBuf> {
    let raw = props.get(key).map(str::trim).filter(|v| !v.is_empty())?;
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(raw)),
    }
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

fn invalid(
    section: &str,
    key: &str,
    value: impl fmt::Display,
    reason: impl fmt::Display,
) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
