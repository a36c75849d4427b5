//! Core types for network elevation providers.

use thiserror::Error;

use crate::BoxFuture;

/// Errors that can occur while querying an elevation service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Transport-level failure (DNS, TLS, connection reset, ...).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The service answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The request did not complete in time.
    #[error("Request timed out")]
    Timeout,

    /// The body could not be interpreted as an elevation.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The service has no elevation for this coordinate.
    #[error("No elevation data at ({lat}, {lon})")]
    NoData { lat: f64, lon: f64 },

    /// A fallback chain was built without any providers.
    #[error("No elevation providers configured")]
    NoProviders,
}

/// A remote elevation service.
///
/// Implementations perform a single lookup per call and never return
/// partially parsed data: anything other than one numeric elevation is an
/// error.
pub trait ElevationProvider: Send + Sync {
    /// Looks up the ground elevation in meters at a coordinate.
    fn elevation(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<f64, ProviderError>>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::Status {
            status: 503,
            url: "https://example.com".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503 from https://example.com");
        assert_eq!(ProviderError::Timeout.to_string(), "Request timed out");
    }
}
