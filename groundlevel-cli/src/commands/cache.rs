//! Cache management CLI commands.

use std::time::Duration;

use clap::Subcommand;
use groundlevel::app::ElevationApp;
use groundlevel::cache::{CacheStats, SpatialCache};
use groundlevel::clock::{Clock, SystemClock};
use groundlevel::config::{ConfigFile, MAX_CACHE_DAYS};
use groundlevel::coord::Coordinate;
use groundlevel::units::{format_accuracy, format_elevation, format_relative_time, Unit};

use super::common::{app_config, UnitArg};
use crate::error::CliError;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show cache statistics
    Stats {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete entries older than the retention period
    Sweep {
        /// Retention in days (defaults to cache.retention_days)
        #[arg(long, value_parser = clap::value_parser!(u64).range(0..=MAX_CACHE_DAYS))]
        days: Option<u64>,
    },

    /// Remove every cached elevation
    Clear,

    /// Look up the cached elevation for a coordinate
    Lookup {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,

        /// Display unit
        #[arg(long, value_enum, default_value_t = UnitArg::Feet)]
        units: UnitArg,
    },

    /// Delete the entry stored for exactly this coordinate
    Delete {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
}

/// Run a cache subcommand.
pub async fn run(action: CacheAction, config: &ConfigFile) -> Result<(), CliError> {
    let app_config = app_config(config)?;
    if let Some(path) = &app_config.cache_path {
        println!("Elevation cache: {}", path.display());
    }

    let app = ElevationApp::start(app_config).await?;
    let result = run_action(action, &app.cache()).await;
    let closed = app.shutdown().await;
    result?;
    closed?;
    Ok(())
}

async fn run_action(action: CacheAction, cache: &SpatialCache) -> Result<(), CliError> {
    match action {
        CacheAction::Stats { json } => {
            let stats = cache.stats().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                for line in render_stats(&stats, SystemClock.now_ms()) {
                    println!("{}", line);
                }
            }
        }
        CacheAction::Sweep { days } => {
            let retention = match days {
                Some(days) => Duration::from_secs(days.saturating_mul(SECS_PER_DAY)),
                None => cache.config().retention,
            };
            let removed = cache.sweep(retention).await?;
            println!("Removed {} expired entries", removed);
        }
        CacheAction::Clear => {
            let removed = cache.clear().await?;
            println!("Removed {} entries", removed);
        }
        CacheAction::Lookup { lat, lon, units } => {
            let position = validate(lat, lon)?;
            match cache.get(position.latitude, position.longitude).await {
                Some(sample) => {
                    println!(
                        "{} ({}) from {}, observed {}",
                        format_elevation(sample.elevation(), Unit::from(units)),
                        format_accuracy(sample.accuracy()),
                        sample.source(),
                        format_relative_time(sample.observed_at(), SystemClock.now_ms())
                    );
                    println!("Stored at {:.4}, {:.4}", sample.latitude(), sample.longitude());
                }
                None => println!("No cached elevation near {}", position.key()),
            }
        }
        CacheAction::Delete { lat, lon } => {
            let position = validate(lat, lon)?;
            if cache.delete(position.latitude, position.longitude).await? {
                println!("Deleted entry {}", position.key());
            } else {
                println!("No entry stored at {}", position.key());
            }
        }
    }
    Ok(())
}

fn validate(lat: f64, lon: f64) -> Result<Coordinate, CliError> {
    Coordinate::new(lat, lon).map_err(|e| CliError::InvalidArgs(e.to_string()))
}

fn render_stats(stats: &CacheStats, now_ms: i64) -> Vec<String> {
    let mut lines = vec![
        format!("  Entries: {}", stats.entries),
        format!("    device:  {}", stats.device_entries),
        format!("    network: {}", stats.network_entries),
        format!("  Fresh:   {}", stats.fresh_entries),
        format!("  Stale:   {}", stats.stale_entries()),
    ];
    if let (Some(oldest), Some(newest)) = (stats.oldest_observed_at, stats.newest_observed_at) {
        lines.push(format!("  Oldest:  {}", format_relative_time(oldest, now_ms)));
        lines.push(format!("  Newest:  {}", format_relative_time(newest, now_ms)));
    }
    lines
}
