//! Network elevation lookups.
//!
//! This module provides the [`ElevationProvider`] abstraction for remote
//! elevation services, the concrete providers, and the
//! [`NetworkElevationSource`] used by the resolution cascade.
//!
//! # Providers
//!
//! - [`OpenMeteoProvider`]: global coverage, default
//! - [`UsgsProvider`]: United States only, high resolution
//! - [`FallbackProvider`]: tries several providers in order
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use groundlevel::network::{NetworkElevationSource, OpenMeteoProvider, ReqwestClient};
//!
//! let provider = OpenMeteoProvider::new(ReqwestClient::new()?);
//! let source = NetworkElevationSource::new(Arc::new(provider));
//! let sample = source.fetch(39.7392, -104.9903).await;
//! ```

mod chain;
mod http;
mod open_meteo;
mod source;
mod types;
mod usgs;

pub use chain::FallbackProvider;
pub use http::{AsyncHttpClient, ReqwestClient, DEFAULT_HTTP_TIMEOUT};
pub use open_meteo::{OpenMeteoProvider, OPEN_METEO_URL};
pub use source::{NetworkElevationSource, DEFAULT_NETWORK_TIMEOUT, NETWORK_ACCURACY_M};
pub use types::{ElevationProvider, ProviderError};
pub use usgs::{UsgsProvider, USGS_EPQS_URL};

#[cfg(test)]
pub use http::tests::MockHttpClient;
