//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use groundlevel::app::AppConfig;
use groundlevel::config::{config_file_path, ConfigFile};
use groundlevel::units::Unit;

use crate::error::CliError;

/// Display unit selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum UnitArg {
    /// Feet
    #[default]
    Feet,
    /// Meters
    Meters,
}

impl From<UnitArg> for Unit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Feet => Unit::Feet,
            UnitArg::Meters => Unit::Meters,
        }
    }
}

/// The config file in effect: `--config` if given, else the default path.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf, CliError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(config_file_path()?),
    }
}

/// Loads the config file; a missing file yields defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<ConfigFile, CliError> {
    Ok(ConfigFile::load_from(&config_path(explicit)?)?)
}

/// Builds the application config from the loaded file.
pub fn app_config(config: &ConfigFile) -> Result<AppConfig, CliError> {
    Ok(AppConfig::from_config_file(config)?)
}
