//! Spatial elevation cache.
//!
//! Wraps an [`ElevationStore`] with coordinate fingerprinting, read-time
//! freshness and a radius-tolerance nearest match. Store failures never reach
//! the caller: reads degrade to a miss and writes are logged and dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::config::{duration_ms, CacheConfig};
use super::stats::CacheStats;
use crate::clock::{Clock, SystemClock};
use crate::coord::{cache_key, planar_distance};
use crate::sample::ElevationSample;
use crate::store::{CacheEntry, ElevationStore, StoreError};

/// Keyed, timestamp-aware cache of elevation samples.
pub struct SpatialCache {
    store: Arc<dyn ElevationStore>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    writes: AtomicU64,
}

impl SpatialCache {
    pub fn new(store: Arc<dyn ElevationStore>, config: CacheConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
            writes: AtomicU64::new(0),
        }
    }

    /// Replace the clock used for ages and write stamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn is_servable(&self, sample: &ElevationSample, now_ms: i64) -> bool {
        sample.age_ms(now_ms) < self.config.validity_ms() && sample.is_plausible()
    }

    /// Looks up a fresh sample at or near a coordinate.
    ///
    /// The exact fingerprint is tried first. Failing that, every fresh entry
    /// within the configured tolerance is considered and the nearest wins,
    /// ties going to the most recent observation.
    pub async fn get(&self, lat: f64, lon: f64) -> Option<ElevationSample> {
        let now = self.clock.now_ms();
        let key = cache_key(lat, lon);

        match self.store.get(&key).await {
            Ok(Some(entry)) if self.is_servable(&entry.sample, now) => {
                debug!(key = %key, elevation = entry.sample.elevation(), "Cache hit (exact)");
                return Some(entry.sample);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed");
                return None;
            }
        }

        let entries = match self.store.get_all().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Cache scan failed");
                return None;
            }
        };

        let nearest = entries
            .into_iter()
            .filter(|entry| self.is_servable(&entry.sample, now))
            .map(|entry| {
                let distance = planar_distance(
                    lat,
                    lon,
                    entry.sample.latitude(),
                    entry.sample.longitude(),
                );
                (distance, entry.sample)
            })
            .filter(|(distance, _)| *distance <= self.config.tolerance_degrees)
            .min_by(|(da, a), (db, b)| {
                da.total_cmp(db)
                    .then_with(|| a.age_ms(now).cmp(&b.age_ms(now)))
            });

        match nearest {
            Some((distance, sample)) => {
                debug!(key = %key, distance, elevation = sample.elevation(), "Cache hit (nearest)");
                Some(sample)
            }
            None => {
                debug!(key = %key, "Cache miss");
                None
            }
        }
    }

    /// Stores a sample under its coordinate fingerprint.
    ///
    /// Implausible samples are dropped. May trigger an expiry sweep
    /// according to the configured [`super::SweepPolicy`].
    pub async fn put(&self, sample: ElevationSample) {
        if !sample.is_plausible() {
            warn!(
                elevation = sample.elevation(),
                lat = sample.latitude(),
                lon = sample.longitude(),
                "Refusing to cache implausible sample"
            );
            return;
        }

        let entry = CacheEntry::new(sample, self.clock.now_ms());
        let key = entry.key.clone();
        if let Err(e) = self.store.put(entry).await {
            warn!(key = %key, error = %e, "Cache write failed");
            return;
        }
        debug!(key = %key, "Cached elevation sample");

        let write_count = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if self.config.sweep_policy.should_sweep(write_count) {
            if let Err(e) = self.sweep(self.config.retention).await {
                warn!(error = %e, "Cache sweep failed");
            }
        }
    }

    /// Removes entries whose observation predates `now - retention`.
    ///
    /// Returns exactly the number of entries removed.
    pub async fn sweep(&self, retention: Duration) -> Result<usize, StoreError> {
        let cutoff = self.clock.now_ms().saturating_sub(duration_ms(retention));
        let removed = self.store.delete_older_than(cutoff).await?;
        if removed > 0 {
            info!(removed, cutoff, "Swept expired cache entries");
        }
        Ok(removed)
    }

    /// Removes the entry stored under the fingerprint of `(lat, lon)`.
    pub async fn delete(&self, lat: f64, lon: f64) -> Result<bool, StoreError> {
        self.store.delete(&cache_key(lat, lon)).await
    }

    /// Removes every entry.
    pub async fn clear(&self) -> Result<usize, StoreError> {
        let removed = self.store.clear().await?;
        info!(removed, "Cleared elevation cache");
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<CacheStats, StoreError> {
        let entries = self.store.get_all().await?;
        Ok(CacheStats::from_entries(
            &entries,
            self.clock.now_ms(),
            self.config.validity_ms(),
        ))
    }
}
