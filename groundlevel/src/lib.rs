//! Groundlevel - find your current elevation
//!
//! This library resolves the elevation at the user's position by cascading
//! through three sources of decreasing reliability: live device altitude, a
//! spatially indexed local cache, and a network elevation service.
//!
//! # High-Level API
//!
//! For most use cases, the [`app`] module wires everything together:
//!
//! ```ignore
//! use groundlevel::app::{AppConfig, ElevationApp};
//! use groundlevel::config::ConfigFile;
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?);
//! let app = ElevationApp::start(config).await?;
//!
//! let resolution = app.resolver().resolve().await?;
//! println!("{} m ({})", resolution.elevation, resolution.source);
//!
//! app.shutdown().await?;
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod app;
pub mod cache;
pub mod cascade;
pub mod clock;
pub mod config;
pub mod coord;
pub mod device;
pub mod landmarks;
pub mod location;
pub mod logging;
pub mod network;
pub mod sample;
pub mod store;
pub mod units;

/// Version of the groundlevel library and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Boxed future type for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
