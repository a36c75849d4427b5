//! Addressable configuration keys for `config get` / `config set`.

use std::fmt;
use std::str::FromStr;

use ini::Ini;

use super::file::{ConfigError, ConfigFile};

const KEYS: &[(&str, &str)] = &[
    ("location", "source"),
    ("location", "gpsd_host"),
    ("location", "gpsd_port"),
    ("location", "latitude"),
    ("location", "longitude"),
    ("location", "altitude"),
    ("location", "altitude_accuracy"),
    ("location", "position_timeout_secs"),
    ("location", "device_timeout_secs"),
    ("network", "provider"),
    ("network", "open_meteo_url"),
    ("network", "usgs_url"),
    ("network", "timeout_secs"),
    ("cache", "path"),
    ("cache", "validity_days"),
    ("cache", "retention_days"),
    ("cache", "tolerance_degrees"),
    ("cache", "sweep_one_in"),
    ("cascade", "accuracy_threshold_m"),
    ("logging", "level"),
    ("logging", "file"),
    ("landmarks", "file"),
];

/// A `section.key` name known to [`ConfigFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigKey {
    section: &'static str,
    key: &'static str,
}

impl ConfigKey {
    /// Every known key, in file order.
    pub fn all() -> impl Iterator<Item = ConfigKey> {
        KEYS.iter().map(|&(section, key)| ConfigKey { section, key })
    }

    pub fn section(&self) -> &'static str {
        self.section
    }

    pub fn key_name(&self) -> &'static str {
        self.key
    }

    /// `section.key`
    pub fn name(&self) -> String {
        format!("{}.{}", self.section, self.key)
    }

    /// Current value as it would be written to the file; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        config
            .to_ini()
            .get_from(Some(self.section), self.key)
            .unwrap_or_default()
            .to_string()
    }

    /// Sets the value, validating the whole configuration afterwards.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let mut ini: Ini = config.to_ini();
        ini.with_section(Some(self.section)).set(self.key, value);
        *config = ConfigFile::from_ini(&ini)?;
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (section, key) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))?;
        Self::all()
            .find(|k| k.section == section && k.key == key)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.key)
    }
}
