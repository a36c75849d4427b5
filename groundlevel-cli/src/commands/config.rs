//! Configuration management CLI commands.
//!
//! `config get`, `config set`, `config list`, `config init` and `config path`
//! operate on `~/.groundlevel/config.ini`, or on the file given with
//! `--config`.

use std::path::Path;

use clap::Subcommand;
use groundlevel::config::{ConfigFile, ConfigKey};

use super::common::{config_path, load_config};
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., cache.validity_days)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., cache.validity_days)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, explicit: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let value = get(&key, &load_config(explicit)?)?;
            println!("{}", if value.is_empty() { "(not set)" } else { &value });
        }
        ConfigCommands::Set { key, value } => {
            let path = config_path(explicit)?;
            let mut config = load_config(explicit)?;
            let config_key = parse_key(&key)?;
            config_key.set(&mut config, &value)?;
            config.save_to(&path)?;
            println!("Set {} = {}", config_key.name(), value);
        }
        ConfigCommands::List => {
            for line in list(&load_config(explicit)?) {
                println!("{}", line);
            }
        }
        ConfigCommands::Init { force } => {
            let path = config_path(explicit)?;
            if path.exists() && !force {
                return Err(CliError::Config(format!(
                    "{} already exists. Use --force to overwrite it.",
                    path.display()
                )));
            }
            ConfigFile::default().save_to(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        ConfigCommands::Path => println!("{}", config_path(explicit)?.display()),
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'groundlevel config list' to see available keys.",
            key
        ))
    })
}

fn get(key: &str, config: &ConfigFile) -> Result<String, CliError> {
    Ok(parse_key(key)?.get(config))
}

fn list(config: &ConfigFile) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_section = "";

    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            if !current_section.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("[{}]", section));
            current_section = section;
        }

        let value = key.get(config);
        if value.is_empty() {
            lines.push(format!("  {} = (not set)", key.key_name()));
        } else {
            lines.push(format!("  {} = {}", key.key_name(), value));
        }
    }
    lines
}
