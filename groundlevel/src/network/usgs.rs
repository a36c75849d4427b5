//! USGS Elevation Point Query Service (EPQS) provider.
//!
//! Backed by the 3DEP national elevation dataset. Coverage is limited to the
//! United States; points outside coverage come back with a large negative
//! sentinel value, which is reported as [`ProviderError::NoData`].
//!
//! # URL Pattern
//!
//! `https://epqs.nationalmap.gov/v1/json?x={lon}&y={lat}&units=Meters&wkid=4326`
//!
//! Note that `x` is longitude and `y` is latitude.
//!
//! # Response
//!
//! ```json
//! {"location":{"x":-105.0,"y":40.0},"value":"1609.52","rasterId":1,"resolution":1}
//! ```
//!
//! `value` has been observed both as a string and as a number.

use serde::Deserialize;
use serde_json::Value;

use super::http::AsyncHttpClient;
use super::types::{ElevationProvider, ProviderError};
use crate::BoxFuture;

/// Default USGS EPQS endpoint.
pub const USGS_EPQS_URL: &str = "https://epqs.nationalmap.gov/v1/json";

/// Values at or below this are the service's "no data" marker (-1000000).
const NO_DATA_THRESHOLD: f64 = -999_999.0;

#[derive(Debug, Deserialize)]
struct EpqsResponse {
    value: Option<Value>,
}

fn parse_response(body: &[u8], lat: f64, lon: f64) -> Result<f64, ProviderError> {
    let response: EpqsResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("malformed JSON: {}", e)))?;

    let value = match response.value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Null) | None => return Err(ProviderError::NoData { lat, lon }),
        Some(other) => {
            return Err(ProviderError::InvalidResponse(format!(
                "unexpected value: {}",
                other
            )))
        }
    };

    match value {
        Some(v) if v.is_finite() && v > NO_DATA_THRESHOLD => Ok(v),
        Some(_) => Err(ProviderError::NoData { lat, lon }),
        None => Err(ProviderError::InvalidResponse(
            "value is not a number".to_string(),
        )),
    }
}

/// USGS EPQS elevation provider.
pub struct UsgsProvider<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
}

impl<C: AsyncHttpClient> UsgsProvider<C> {
    /// Creates a provider against the public endpoint.
    pub fn new(http_client: C) -> Self {
        Self::with_base_url(http_client, USGS_EPQS_URL)
    }

    /// Creates a provider against a custom endpoint.
    pub fn with_base_url(http_client: C, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    /// EPQS uses `x` for longitude and `y` for latitude.
    fn build_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}?x={}&y={}&units=Meters&wkid=4326",
            self.base_url, lon, lat
        )
    }
}

impl<C: AsyncHttpClient> ElevationProvider for UsgsProvider<C> {
    fn elevation(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<f64, ProviderError>> {
        Box::pin(async move {
            let url = self.build_url(lat, lon);
            let body = self.http_client.get(&url).await?;
            parse_response(&body, lat, lon)
        })
    }

    fn name(&self) -> &str {
        "USGS EPQS"
    }
}
