//! Application bootstrap and lifecycle management.
//!
//! [`ElevationApp`] owns the single handle to the elevation store: it opens
//! the store at start, builds the location, device, network and cache
//! components around it, and flushes it on shutdown.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      ElevationApp                         │
//! │                                                           │
//! │  ElevationStore (file / memory) ──► SpatialCache          │
//! │                                          │                │
//! │  LocationProvider ──► DeviceAltitudeSource                │
//! │        │                    │            │                │
//! │        └────────────────► Resolver ◄─────┘                │
//! │                             ▲                             │
//! │  ElevationProvider ──► NetworkElevationSource             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use groundlevel::app::{AppConfig, ElevationApp};
//!
//! let app = ElevationApp::start(config).await?;
//! let resolution = app.resolver().resolve().await?;
//! app.shutdown().await?;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::ElevationApp;
pub use config::{AppConfig, LocationConfig, LocationMode, NetworkConfig};
pub use error::AppError;
