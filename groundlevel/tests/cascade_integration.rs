//! Integration tests for the elevation cascade.
//!
//! These tests drive a `Resolver` through its public API with scripted
//! location and elevation providers:
//! - device altitude accepted, written through to the cache
//! - poor device altitude falling back to a nearby cached value
//! - cache miss falling back to the network
//! - every source failing
//! - a file-backed cache surviving a restart
//! - concurrent writers, readers and sweeps on one fingerprint
//!
//! Run with: `cargo test --test cascade_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use groundlevel::cache::{CacheConfig, SpatialCache, SweepPolicy};
use groundlevel::cascade::{FailureKind, ResolveStage, Resolver};
use groundlevel::clock::{Clock, ManualClock, DAY_MS};
use groundlevel::location::{LocationProvider, PlatformError, PositionFix, PositionRequest};
use groundlevel::network::{ElevationProvider, NetworkElevationSource, ProviderError};
use groundlevel::sample::{ElevationSample, ElevationSource};
use groundlevel::store::{ElevationStore, FileStore, MemoryStore};
use groundlevel::BoxFuture;

const NOW: i64 = 1_700_000_000_000;

// Denver
const LAT: f64 = 39.7392;
const LON: f64 = -104.9903;

// ============================================================================
// Scripted collaborators
// ============================================================================

/// Location provider that answers coarse and high-accuracy requests from
/// separate scripts.
struct ScriptedLocation {
    coarse: Result<PositionFix, PlatformError>,
    precise: Result<PositionFix, PlatformError>,
}

impl ScriptedLocation {
    fn at(lat: f64, lon: f64, altitude: Option<(f64, f64)>) -> Self {
        let fix = PositionFix {
            latitude: lat,
            longitude: lon,
            altitude: altitude.map(|(alt, _)| alt),
            altitude_accuracy: altitude.map(|(_, acc)| acc),
            timestamp_ms: NOW,
        };
        Self {
            coarse: Ok(PositionFix {
                altitude: None,
                altitude_accuracy: None,
                ..fix.clone()
            }),
            precise: Ok(fix),
        }
    }

    fn failing(err: PlatformError) -> Self {
        Self {
            coarse: Err(err.clone()),
            precise: Err(err),
        }
    }
}

impl LocationProvider for ScriptedLocation {
    fn current_position(
        &self,
        request: PositionRequest,
    ) -> BoxFuture<'_, Result<PositionFix, PlatformError>> {
        let answer = if request.high_accuracy {
            self.precise.clone()
        } else {
            self.coarse.clone()
        };
        Box::pin(async move { answer })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Elevation provider returning a fixed answer and counting calls.
struct CountingProvider {
    answer: Result<f64, ProviderError>,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn returning(elevation: f64) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(elevation),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: Err(ProviderError::Timeout),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ElevationProvider for CountingProvider {
    fn elevation(&self, _lat: f64, _lon: f64) -> BoxFuture<'_, Result<f64, ProviderError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.answer.clone();
        Box::pin(async move { answer })
    }

    fn name(&self) -> &str {
        "counting"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(NOW))
}

fn cache_over(store: Arc<dyn ElevationStore>, clock: Arc<ManualClock>) -> Arc<SpatialCache> {
    let config = CacheConfig::default().with_sweep_policy(SweepPolicy::Never);
    Arc::new(SpatialCache::new(store, config).with_clock(clock))
}

fn resolver(
    location: ScriptedLocation,
    cache: Arc<SpatialCache>,
    provider: Arc<CountingProvider>,
    clock: Arc<ManualClock>,
) -> Resolver {
    let network = NetworkElevationSource::new(provider).with_clock(clock);
    Resolver::new(Arc::new(location), cache, network)
}

fn network_sample(elevation: f64, lat: f64, lon: f64, observed_at: i64) -> ElevationSample {
    ElevationSample::new(ElevationSource::Network, elevation, lat, lon, 10.0, observed_at)
}

// ============================================================================
// Cascade scenarios
// ============================================================================

#[tokio::test]
async fn test_accurate_device_altitude_wins_and_is_cached() {
    let clock = clock();
    let cache = cache_over(Arc::new(MemoryStore::new()), Arc::clone(&clock));
    let provider = CountingProvider::returning(1600.0);
    let resolver = resolver(
        ScriptedLocation::at(LAT, LON, Some((1612.0, 8.0))),
        Arc::clone(&cache),
        Arc::clone(&provider),
        clock,
    );

    let resolution = resolver.resolve().await.unwrap();

    assert_eq!(resolution.source, ElevationSource::Device);
    assert_eq!(resolution.elevation, 1612.0);
    assert_eq!(resolution.accuracy, 8.0);
    assert!(!resolution.served_from_cache);
    assert_eq!(provider.calls(), 0);

    let cached = cache.get(LAT, LON).await.unwrap();
    assert_eq!(cached.source(), ElevationSource::Device);
}

#[tokio::test]
async fn test_poor_device_altitude_falls_back_to_nearby_cache() {
    let clock = clock();
    let cache = cache_over(Arc::new(MemoryStore::new()), Arc::clone(&clock));
    cache
        .put(network_sample(1609.0, LAT + 0.004, LON - 0.003, NOW - 2 * DAY_MS))
        .await;
    let provider = CountingProvider::returning(1600.0);
    let resolver = resolver(
        ScriptedLocation::at(LAT, LON, Some((1700.0, 80.0))),
        cache,
        Arc::clone(&provider),
        clock,
    );

    let resolution = resolver.resolve().await.unwrap();

    assert_eq!(resolution.source, ElevationSource::Cache);
    assert!(resolution.served_from_cache);
    assert_eq!(resolution.elevation, 1609.0);
    assert_eq!(resolution.observed_at, NOW - 2 * DAY_MS);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_cache_miss_goes_to_network_and_second_call_hits_cache() {
    let clock = clock();
    let cache = cache_over(Arc::new(MemoryStore::new()), Arc::clone(&clock));
    let provider = CountingProvider::returning(1600.0);
    let resolver = resolver(
        ScriptedLocation::at(LAT, LON, None),
        Arc::clone(&cache),
        Arc::clone(&provider),
        Arc::clone(&clock),
    );

    let first = resolver.resolve().await.unwrap();
    assert_eq!(first.source, ElevationSource::Network);
    assert_eq!(first.accuracy, 10.0);
    assert_eq!(first.observed_at, NOW);

    clock.advance(60 * 60 * 1000);
    let second = resolver.resolve().await.unwrap();
    assert_eq!(second.source, ElevationSource::Cache);
    assert_eq!(second.elevation, 1600.0);
    assert_eq!(second.observed_at, NOW);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_stale_cache_is_refreshed_from_network() {
    let clock = clock();
    let cache = cache_over(Arc::new(MemoryStore::new()), Arc::clone(&clock));
    cache.put(network_sample(1500.0, LAT, LON, NOW - 8 * DAY_MS)).await;
    let provider = CountingProvider::returning(1600.0);
    let resolver = resolver(
        ScriptedLocation::at(LAT, LON, None),
        Arc::clone(&cache),
        Arc::clone(&provider),
        clock,
    );

    let resolution = resolver.resolve().await.unwrap();

    assert_eq!(resolution.source, ElevationSource::Network);
    assert_eq!(resolution.elevation, 1600.0);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(LAT, LON).await.unwrap().observed_at(), NOW);
}

#[tokio::test]
async fn test_all_sources_failing_reports_elevation_unavailable() {
    let clock = clock();
    let cache = cache_over(Arc::new(MemoryStore::new()), Arc::clone(&clock));
    let provider = CountingProvider::failing();
    let resolver = resolver(
        ScriptedLocation::at(LAT, LON, None),
        Arc::clone(&cache),
        Arc::clone(&provider),
        clock,
    );

    let stages = parking_lot::Mutex::new(Vec::new());
    let err = resolver
        .resolve_with_progress(|stage, _| stages.lock().push(stage))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::ElevationUnavailable);
    assert_eq!(provider.calls(), 1);
    assert!(cache.is_empty());
    assert_eq!(
        stages.into_inner(),
        vec![
            ResolveStage::AcquiringPosition,
            ResolveStage::TryingDevice,
            ResolveStage::CheckingCache,
            ResolveStage::QueryingNetwork,
            ResolveStage::Failed,
        ]
    );
}

#[tokio::test]
async fn test_permission_denied_stops_the_cascade() {
    let clock = clock();
    let cache = cache_over(Arc::new(MemoryStore::new()), Arc::clone(&clock));
    cache.put(network_sample(1609.0, LAT, LON, NOW)).await;
    let provider = CountingProvider::returning(1600.0);
    let resolver = resolver(
        ScriptedLocation::failing(PlatformError::PermissionDenied("blocked".into())),
        cache,
        Arc::clone(&provider),
        clock,
    );

    let err = resolver.resolve().await.unwrap_err();

    assert_eq!(err.kind, FailureKind::PermissionDenied);
    assert_eq!(provider.calls(), 0);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_file_cache_serves_after_restart() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("elevations.bin");
    let clock = clock();

    {
        let store: Arc<dyn ElevationStore> = Arc::new(FileStore::open(&path).unwrap());
        let cache = cache_over(Arc::clone(&store), Arc::clone(&clock));
        let provider = CountingProvider::returning(1600.0);
        let resolver = resolver(
            ScriptedLocation::at(LAT, LON, None),
            cache,
            provider,
            Arc::clone(&clock),
        );
        assert_eq!(
            resolver.resolve().await.unwrap().source,
            ElevationSource::Network
        );
        store.close().await.unwrap();
    }

    clock.advance(DAY_MS);
    let store: Arc<dyn ElevationStore> = Arc::new(FileStore::open(&path).unwrap());
    let cache = cache_over(Arc::clone(&store), Arc::clone(&clock));
    let provider = CountingProvider::failing();
    let resolver = resolver(
        ScriptedLocation::at(LAT + 0.001, LON, None),
        cache,
        Arc::clone(&provider),
        Arc::clone(&clock),
    );

    let resolution = resolver.resolve().await.unwrap();
    assert_eq!(resolution.source, ElevationSource::Cache);
    assert_eq!(resolution.elevation, 1600.0);
    assert_eq!(provider.calls(), 0);
    store.close().await.unwrap();
}

#[tokio::test]
async fn test_sweep_drops_expired_entries_only() {
    let clock = clock();
    let store = Arc::new(MemoryStore::new());
    let cache = cache_over(store.clone(), Arc::clone(&clock));
    cache.put(network_sample(100.0, 1.0, 1.0, NOW - 40 * DAY_MS)).await;
    cache.put(network_sample(200.0, 2.0, 2.0, NOW - 10 * DAY_MS)).await;
    cache.put(network_sample(300.0, 3.0, 3.0, NOW)).await;

    let removed = cache
        .sweep(Duration::from_millis((30 * DAY_MS) as u64))
        .await
        .unwrap();

    assert_eq!(removed, 1);
    assert_eq!(store.len(), 2);
    assert!(cache.get(2.0, 2.0).await.is_none());
    assert_eq!(cache.get(3.0, 3.0).await.unwrap().elevation(), 300.0);
    assert_eq!(clock.now_ms(), NOW);
}

// ============================================================================
// Concurrent access
// ============================================================================

const WRITERS: usize = 16;

/// Races writers, readers and sweeps on one fingerprint, with an expired
/// entry elsewhere for the sweeps to remove. Returns the elevations written.
async fn hammer_one_key(cache: Arc<SpatialCache>) -> Vec<f64> {
    cache.put(network_sample(100.0, 1.0, 1.0, NOW - 40 * DAY_MS)).await;
    let retention = Duration::from_millis((30 * DAY_MS) as u64);
    let written: Vec<f64> = (0..WRITERS).map(|i| 1600.0 + i as f64).collect();

    let mut handles = Vec::new();
    for &elevation in &written {
        let writer = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            writer.put(network_sample(elevation, LAT, LON, NOW)).await;
        }));

        let reader = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            if let Some(sample) = reader.get(LAT, LON).await {
                assert_eq!(sample.observed_at(), NOW);
            }
        }));

        let sweeper = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            sweeper.sweep(retention).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    written
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access_memory_store() {
    let store = Arc::new(MemoryStore::new());
    let cache = cache_over(store.clone(), clock());

    let written = hammer_one_key(Arc::clone(&cache)).await;

    assert_eq!(store.len(), 1);
    assert!(cache.get(1.0, 1.0).await.is_none());
    let survivor = cache.get(LAT, LON).await.unwrap();
    assert!(written.contains(&survivor.elevation()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access_file_store_reloads() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("elevations.bin");
    let clock = clock();

    let store: Arc<dyn ElevationStore> = Arc::new(FileStore::open(&path).unwrap());
    let cache = cache_over(Arc::clone(&store), Arc::clone(&clock));

    let written = hammer_one_key(Arc::clone(&cache)).await;

    assert_eq!(store.len(), 1);
    let survivor = cache.get(LAT, LON).await.unwrap();
    assert!(written.contains(&survivor.elevation()));
    store.close().await.unwrap();

    let reopened: Arc<dyn ElevationStore> = Arc::new(FileStore::open(&path).unwrap());
    assert_eq!(reopened.len(), 1);
    let reloaded = cache_over(Arc::clone(&reopened), clock)
        .get(LAT, LON)
        .await
        .unwrap();
    assert_eq!(reloaded, survivor);
    assert!(!path.with_extension("tmp").exists());
}
