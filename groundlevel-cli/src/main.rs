//! groundlevel - find your current elevation.
//!
//! Runs the device / cache / network cascade from the command line and
//! manages the local elevation cache and configuration file.

mod commands;
mod error;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use groundlevel::config::ConfigFile;
use groundlevel::logging::{self, WorkerGuard};

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use commands::resolve::ResolveArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "groundlevel", version = groundlevel::VERSION, about)]
struct Cli {
    /// Configuration file (defaults to ~/.groundlevel/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve the current elevation (default)
    Resolve(ResolveArgs),

    /// Manage the local elevation cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// View and edit configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let explicit = cli.config.as_deref();
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Resolve(ResolveArgs::default()));

    match command {
        Commands::Config { command } => commands::config::run(command, explicit),
        Commands::Resolve(args) => {
            let (config, _guard) = prepare(explicit, cli.verbose)?;
            commands::resolve::run(args, &config).await
        }
        Commands::Cache { action } => {
            let (config, _guard) = prepare(explicit, cli.verbose)?;
            commands::cache::run(action, &config).await
        }
    }
}

/// Loads the config file and installs logging. Keep the guard alive until
/// the command finishes.
fn prepare(
    explicit: Option<&Path>,
    verbose: bool,
) -> Result<(ConfigFile, Option<WorkerGuard>), CliError> {
    let config = commands::common::load_config(explicit)?;
    let level = if verbose {
        "groundlevel=debug,warn"
    } else {
        config.logging.level.as_str()
    };
    let guard = logging::init(level, config.logging.file.as_deref())?;
    Ok((config, guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_invocation_has_no_subcommand() {
        let cli = Cli::try_parse_from(["groundlevel"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_negative_coordinates_parse() {
        let cli = Cli::try_parse_from([
            "groundlevel",
            "resolve",
            "--lat",
            "-33.8688",
            "--lon",
            "151.2093",
            "--units",
            "meters",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Resolve(args)) => {
                assert_eq!(args.lat, Some(-33.8688));
                assert_eq!(args.lon, Some(151.2093));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_lat_requires_lon() {
        assert!(Cli::try_parse_from(["groundlevel", "resolve", "--lat", "10"]).is_err());
    }

    #[test]
    fn test_sweep_days_are_bounded() {
        assert!(Cli::try_parse_from(["groundlevel", "cache", "sweep", "--days", "36500"]).is_ok());
        assert!(Cli::try_parse_from([
            "groundlevel",
            "cache",
            "sweep",
            "--days",
            "300000000000000",
        ])
        .is_err());
    }

    #[test]
    fn test_progress_conflicts_with_json() {
        assert!(Cli::try_parse_from(["groundlevel", "resolve", "--progress", "--json"]).is_err());
    }
}
