//! Open-Meteo elevation provider.
//!
//! Free global elevation lookups backed by the Copernicus 90m DEM. No API
//! key required.
//!
//! # URL Pattern
//!
//! `https://api.open-meteo.com/v1/elevation?latitude={lat}&longitude={lon}`
//!
//! # Response
//!
//! ```json
//! {"elevation":[1609.0]}
//! ```
//!
//! The service accepts several coordinates per request and returns one
//! elevation per coordinate; we always ask for one and use the first element.

use serde::Deserialize;

use super::http::AsyncHttpClient;
use super::types::{ElevationProvider, ProviderError};
use crate::BoxFuture;

/// Default Open-Meteo elevation endpoint.
pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/elevation";

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    elevation: Option<Vec<f64>>,
}

/// Parses an Open-Meteo response body into a single elevation.
fn parse_response(body: &[u8], lat: f64, lon: f64) -> Result<f64, ProviderError> {
    let response: OpenMeteoResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("malformed JSON: {}", e)))?;

    let elevations = response
        .elevation
        .ok_or_else(|| ProviderError::InvalidResponse("missing elevation field".to_string()))?;

    elevations
        .first()
        .copied()
        .filter(|e| e.is_finite())
        .ok_or(ProviderError::NoData { lat, lon })
}

/// Open-Meteo elevation provider.
pub struct OpenMeteoProvider<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
}

impl<C: AsyncHttpClient> OpenMeteoProvider<C> {
    /// Creates a provider against the public endpoint.
    pub fn new(http_client: C) -> Self {
        Self::with_base_url(http_client, OPEN_METEO_URL)
    }

    /// Creates a provider against a custom endpoint (self-hosted or proxy).
    pub fn with_base_url(http_client: C, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    fn build_url(&self, lat: f64, lon: f64) -> String {
        format!("{}?latitude={}&longitude={}", self.base_url, lat, lon)
    }
}

impl<C: AsyncHttpClient> ElevationProvider for OpenMeteoProvider<C> {
    fn elevation(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<f64, ProviderError>> {
        Box::pin(async move {
            let url = self.build_url(lat, lon);
            let body = self.http_client.get(&url).await?;
            parse_response(&body, lat, lon)
        })
    }

    fn name(&self) -> &str {
        "Open-Meteo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::MockHttpClient;

    #[test]
    fn test_url_construction() {
        let provider = OpenMeteoProvider::new(MockHttpClient::ok("{}"));
        assert_eq!(
            provider.build_url(40.001, -105.25),
            "https://api.open-meteo.com/v1/elevation?latitude=40.001&longitude=-105.25"
        );
    }

    #[test]
    fn test_custom_base_url() {
        let provider =
            OpenMeteoProvider::with_base_url(MockHttpClient::ok("{}"), "http://localhost:8080/e");
        assert!(provider
            .build_url(1.0, 2.0)
            .starts_with("http://localhost:8080/e?latitude=1"));
    }

    #[tokio::test]
    async fn test_parses_first_element() {
        let provider = OpenMeteoProvider::new(MockHttpClient::ok(r#"{"elevation":[210.0,99.0]}"#));
        assert_eq!(provider.elevation(38.0, -90.0).await, Ok(210.0));
    }

    #[tokio::test]
    async fn test_empty_array_is_no_data() {
        let provider = OpenMeteoProvider::new(MockHttpClient::ok(r#"{"elevation":[]}"#));
        assert!(matches!(
            provider.elevation(1.0, 2.0).await,
            Err(ProviderError::NoData { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_field_is_invalid() {
        let provider = OpenMeteoProvider::new(MockHttpClient::ok(r#"{"error":true}"#));
        assert!(matches!(
            provider.elevation(1.0, 2.0).await,
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_garbage_is_invalid() {
        let provider = OpenMeteoProvider::new(MockHttpClient::ok("<html>oops</html>"));
        assert!(matches!(
            provider.elevation(1.0, 2.0).await,
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_http_error_propagates() {
        let provider = OpenMeteoProvider::new(MockHttpClient::err(ProviderError::Status {
            status: 429,
            url: "x".into(),
        }));
        assert!(matches!(
            provider.elevation(1.0, 2.0).await,
            Err(ProviderError::Status { status: 429, .. })
        ));
    }
}
