//! `groundlevel resolve`: run the elevation cascade once and print the result.

use std::path::Path;
use std::time::Duration;

use clap::Args;
use console::style;
use groundlevel::app::{AppError, ElevationApp, LocationConfig};
use groundlevel::cascade::{Resolution, ResolveError, ResolveStage, Resolver};
use groundlevel::clock::{Clock, SystemClock};
use groundlevel::config::ConfigFile;
use groundlevel::landmarks::{comparison_message, LandmarkCatalog, DEFAULT_CLOSEST_TOLERANCE_M};
use groundlevel::units::{format_accuracy, format_elevation, format_relative_time, Unit};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};
use tracing::warn;

use super::common::{app_config, UnitArg};
use crate::error::CliError;

/// Arguments for the resolve command.
#[derive(Debug, Default, Args)]
pub struct ResolveArgs {
    /// Use this latitude instead of the configured location source
    #[arg(long, allow_negative_numbers = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Use this longitude instead of the configured location source
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    pub lon: Option<f64>,

    /// Device altitude in meters to report with --lat/--lon
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    pub alt: Option<f64>,

    /// Vertical accuracy of --alt in meters
    #[arg(long, requires = "alt")]
    pub alt_accuracy: Option<f64>,

    /// Display unit
    #[arg(long, value_enum, default_value_t = UnitArg::Feet)]
    pub units: UnitArg,

    /// Show a spinner with each cascade stage
    #[arg(long, conflicts_with = "json")]
    pub progress: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl ResolveArgs {
    fn location_override(&self) -> Option<LocationConfig> {
        let (lat, lon) = (self.lat?, self.lon?);
        let location = LocationConfig::fixed(lat, lon);
        Some(match self.alt {
            Some(alt) => location.with_altitude(alt, self.alt_accuracy),
            None => location,
        })
    }
}

/// Run the resolve command.
pub async fn run(args: ResolveArgs, config: &ConfigFile) -> Result<(), CliError> {
    let mut app_config = app_config(config)?;
    if let Some(location) = args.location_override() {
        let device_timeout = app_config.location.device_timeout;
        app_config = app_config.with_location(location.with_device_timeout(device_timeout));
    }

    let app = ElevationApp::start(app_config).await?;
    let resolver = app.resolver();
    let outcome = if args.progress {
        resolve_with_spinner(&resolver).await
    } else {
        resolver.resolve().await
    };
    let closed = app.shutdown().await;

    let unit = Unit::from(args.units);
    let resolution = match outcome {
        Ok(resolution) => resolution,
        Err(e) => {
            warn_if_not_closed(&closed);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&error_json(&e))?);
            }
            return Err(e.into());
        }
    };
    closed?;

    if !resolution.is_plausible() {
        warn!(elevation = resolution.elevation, "Resolved elevation looks implausible");
    }

    let landmarks = load_landmarks(config.landmarks.file.as_deref());
    let comparison = landmarks
        .find_closest(resolution.elevation, DEFAULT_CLOSEST_TOLERANCE_M)
        .map(|landmark| comparison_message(resolution.elevation, landmark, unit));

    if args.json {
        let output = resolution_json(&resolution, unit, comparison.as_deref())?;
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let now = SystemClock.now_ms();
        for line in render(&resolution, unit, now, comparison.as_deref()) {
            println!("{}", line);
        }
    }

    Ok(())
}

async fn resolve_with_spinner(resolver: &Resolver) -> Result<Resolution, ResolveError> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    resolver
        .resolve_with_progress(|stage, message| match stage {
            ResolveStage::Resolved => {
                spinner.finish_with_message(format!("{} {}", style("✓").green(), message))
            }
            ResolveStage::Failed => {
                spinner.abandon_with_message(format!("{} {}", style("✗").red(), message))
            }
            _ => spinner.set_message(message.to_string()),
        })
        .await
}

/// Logs a shutdown failure that would otherwise be masked by a resolve error.
fn warn_if_not_closed(closed: &Result<(), AppError>) -> bool {
    match closed {
        Ok(()) => false,
        Err(e) => {
            warn!(error = %e, "Failed to close elevation cache");
            true
        }
    }
}

/// Built-in landmarks plus the configured extra file, if it loads.
fn load_landmarks(extra: Option<&Path>) -> LandmarkCatalog {
    let mut catalog = LandmarkCatalog::builtin();
    if let Some(path) = extra {
        if let Err(e) = catalog.extend_from_file(path) {
            warn!(path = %path.display(), error = %e, "Ignoring landmark file");
        }
    }
    catalog
}

fn render(resolution: &Resolution, unit: Unit, now_ms: i64, comparison: Option<&str>) -> Vec<String> {
    let age = format_relative_time(resolution.observed_at, now_ms);
    let source = if resolution.served_from_cache {
        format!("{} (observed {})", resolution.source, age)
    } else {
        format!("{} ({})", resolution.source, age)
    };
    let accuracy = if resolution.has_default_accuracy() {
        "unknown".to_string()
    } else {
        format_accuracy(resolution.accuracy)
    };

    let mut lines = vec![
        format!(
            "{}  {}",
            style("Elevation:").bold(),
            style(format_elevation(resolution.elevation, unit)).bold()
        ),
        format!("{}   {}", style("Accuracy:").bold(), accuracy),
        format!("{}     {}", style("Source:").bold(), source),
        format!(
            "{}   {:.4}, {:.4}",
            style("Location:").bold(),
            resolution.latitude,
            resolution.longitude
        ),
    ];
    if let Some(comparison) = comparison {
        lines.push(String::new());
        lines.push(comparison.to_string());
    }
    lines
}

fn resolution_json(
    resolution: &Resolution,
    unit: Unit,
    comparison: Option<&str>,
) -> Result<Value, CliError> {
    let mut output = serde_json::to_value(resolution)?;
    if let Value::Object(map) = &mut output {
        map.insert("display".into(), json!(format_elevation(resolution.elevation, unit)));
        map.insert("units".into(), json!(unit.to_string()));
        map.insert("landmark".into(), json!(comparison));
    }
    Ok(output)
}

fn error_json(err: &ResolveError) -> Value {
    json!({ "error": err })
}
