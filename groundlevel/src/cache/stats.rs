//! Cache statistics.

use serde::Serialize;

use crate::sample::ElevationSource;
use crate::store::CacheEntry;

/// Point-in-time summary of the cache contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub device_entries: usize,
    pub network_entries: usize,
    /// Entries currently servable (within the validity horizon).
    pub fresh_entries: usize,
    /// Oldest `observed_at`, epoch milliseconds.
    pub oldest_observed_at: Option<i64>,
    /// Newest `observed_at`, epoch milliseconds.
    pub newest_observed_at: Option<i64>,
}

impl CacheStats {
    pub(crate) fn from_entries(entries: &[CacheEntry], now_ms: i64, validity_ms: i64) -> Self {
        let mut stats = CacheStats {
            entries: entries.len(),
            ..Default::default()
        };

        for entry in entries {
            let sample = &entry.sample;
            match sample.source() {
                ElevationSource::Device => stats.device_entries += 1,
                ElevationSource::Network => stats.network_entries += 1,
                ElevationSource::Cache => {}
            }
            if sample.age_ms(now_ms) < validity_ms {
                stats.fresh_entries += 1;
            }

            let observed = sample.observed_at();
            stats.oldest_observed_at = Some(stats.oldest_observed_at.map_or(observed, |o| o.min(observed)));
            stats.newest_observed_at = Some(stats.newest_observed_at.map_or(observed, |n| n.max(observed)));
        }

        stats
    }

    /// Entries past the validity horizon but not yet swept.
    pub fn stale_entries(&self) -> usize {
        self.entries - self.fresh_entries
    }
}
