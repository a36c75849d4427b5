//! Well-known file locations under `~/.groundlevel`.

use std::path::PathBuf;

use super::file::ConfigError;

const CONFIG_DIR_NAME: &str = ".groundlevel";
const CONFIG_FILE_NAME: &str = "config.ini";
const CACHE_FILE_NAME: &str = "elevation-cache.bin";

/// `~/.groundlevel`
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

/// `~/.groundlevel/config.ini`
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// `~/.groundlevel/elevation-cache.bin`
pub fn default_cache_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CACHE_FILE_NAME))
}
