//! Ordered fallback across several elevation providers.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::types::{ElevationProvider, ProviderError};
use crate::BoxFuture;

/// Tries each provider in order and returns the first elevation found.
///
/// Each provider is asked at most once per lookup. If all fail, the last
/// provider's error is returned. With an attempt timeout, a stalled provider
/// is abandoned after that long and the next one is tried.
pub struct FallbackProvider {
    providers: Vec<Arc<dyn ElevationProvider>>,
    attempt_timeout: Option<Duration>,
}

impl FallbackProvider {
    pub fn new(providers: Vec<Arc<dyn ElevationProvider>>) -> Self {
        Self {
            providers,
            attempt_timeout: None,
        }
    }

    /// Bound each provider attempt separately.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Worst-case time for one lookup across the whole chain.
    pub fn total_budget(&self) -> Option<Duration> {
        let attempts = u32::try_from(self.providers.len()).unwrap_or(u32::MAX);
        self.attempt_timeout.map(|t| t.saturating_mul(attempts))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ElevationProvider for FallbackProvider {
    fn elevation(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<f64, ProviderError>> {
        Box::pin(async move {
            let mut last_error = ProviderError::NoProviders;
            for provider in &self.providers {
                let attempt = provider.elevation(lat, lon);
                let outcome = match self.attempt_timeout {
                    Some(timeout) => tokio::time::timeout(timeout, attempt)
                        .await
                        .unwrap_or(Err(ProviderError::Timeout)),
                    None => attempt.await,
                };
                match outcome {
                    Ok(elevation) => return Ok(elevation),
                    Err(e) => {
                        warn!(provider = provider.name(), error = %e, "Elevation provider failed");
                        last_error = e;
                    }
                }
            }
            Err(last_error)
        })
    }

    fn name(&self) -> &str {
        "fallback chain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{MockHttpClient, NetworkElevationSource, OpenMeteoProvider, UsgsProvider};

    struct StalledProvider;

    impl ElevationProvider for StalledProvider {
        fn elevation(&self, _lat: f64, _lon: f64) -> BoxFuture<'_, Result<f64, ProviderError>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(0.0)
            })
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    fn stalled() -> Arc<dyn ElevationProvider> {
        Arc::new(StalledProvider)
    }

    fn open_meteo(body: &str) -> Arc<dyn ElevationProvider> {
        Arc::new(OpenMeteoProvider::new(MockHttpClient::ok(body)))
    }

    fn failing(error: ProviderError) -> Arc<dyn ElevationProvider> {
        Arc::new(OpenMeteoProvider::new(MockHttpClient::err(error)))
    }

    fn usgs(body: &str) -> Arc<dyn ElevationProvider> {
        Arc::new(UsgsProvider::new(MockHttpClient::ok(body)))
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let chain = FallbackProvider::new(vec![
            open_meteo(r#"{"elevation":[100.0]}"#),
            open_meteo(r#"{"elevation":[200.0]}"#),
        ]);
        assert_eq!(chain.elevation(0.0, 0.0).await, Ok(100.0));
    }

    #[tokio::test]
    async fn test_falls_through_to_secondary() {
        let chain = FallbackProvider::new(vec![
            failing(ProviderError::Timeout),
            usgs(r#"{"value":"55.5"}"#),
        ]);
        assert_eq!(chain.elevation(40.0, -100.0).await, Ok(55.5));
    }

    #[tokio::test]
    async fn test_all_fail_returns_last_error() {
        let chain = FallbackProvider::new(vec![failing(ProviderError::Timeout), open_meteo("garbage")]);
        assert!(matches!(
            chain.elevation(0.0, 0.0).await,
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain = FallbackProvider::new(Vec::new());
        assert!(chain.is_empty());
        assert_eq!(
            chain.elevation(0.0, 0.0).await,
            Err(ProviderError::NoProviders)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_primary_falls_through_within_budget() {
        let attempt = Duration::from_secs(5);
        let chain = FallbackProvider::new(vec![
            stalled(),
            usgs(r#"{"value":"1609.0"}"#),
        ])
        .with_attempt_timeout(attempt);
        assert_eq!(chain.total_budget(), Some(Duration::from_secs(10)));

        let source = NetworkElevationSource::new(Arc::new(chain)).with_timeout(attempt * 2);
        let sample = source.fetch(39.7392, -104.9903).await.unwrap();
        assert_eq!(sample.elevation(), 1609.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_attempts_report_timeout() {
        let chain = FallbackProvider::new(vec![stalled(), stalled()])
            .with_attempt_timeout(Duration::from_secs(1));
        assert_eq!(chain.elevation(0.0, 0.0).await, Err(ProviderError::Timeout));
        assert_eq!(FallbackProvider::new(Vec::new()).total_budget(), None);
    }
}
