//! In-memory elevation store using dashmap.
//!
//! Nothing survives the process. Used for tests, `--no-persist` style runs,
//! and as the reference behaviour for [`super::FileStore`].

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

use super::traits::{CacheEntry, ElevationStore, StoreError};
use crate::BoxFuture;

/// Volatile store backed by a concurrent hash map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

impl ElevationStore for MemoryStore {
    fn put(&self, entry: CacheEntry) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.ensure_open()?;
            self.entries.insert(entry.key.clone(), entry);
            Ok(())
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<CacheEntry>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            self.ensure_open()?;
            Ok(self.entries.get(&key).map(|e| e.value().clone()))
        })
    }

    fn get_all(&self) -> BoxFuture<'_, Result<Vec<CacheEntry>, StoreError>> {
        Box::pin(async move {
            self.ensure_open()?;
            Ok(self.entries.iter().map(|e| e.value().clone()).collect())
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            self.ensure_open()?;
            Ok(self.entries.remove(&key).is_some())
        })
    }

    fn delete_older_than(&self, cutoff_ms: i64) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            self.ensure_open()?;
            let mut removed = 0;
            self.entries.retain(|_, entry| {
                let keep = entry.sample.observed_at() >= cutoff_ms;
                if !keep {
                    removed += 1;
                }
                keep
            });
            Ok(removed)
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            self.ensure_open()?;
            let removed = self.entries.len();
            self.entries.clear();
            Ok(removed)
        })
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn close(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.closed.store(true, Ordering::Release);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{ElevationSample, ElevationSource};

    fn entry(lat: f64, lon: f64, elevation: f64, observed_at: i64) -> CacheEntry {
        CacheEntry::new(
            ElevationSample::new(ElevationSource::Device, elevation, lat, lon, 5.0, observed_at),
            observed_at,
        )
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();
        let e = entry(40.0, -105.0, 1600.0, 1);
        store.put(e.clone()).await.unwrap();

        assert_eq!(store.get(&e.key).await.unwrap(), Some(e));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = MemoryStore::new();
        store.put(entry(40.0, -105.0, 1600.0, 1)).await.unwrap();
        store.put(entry(40.00001, -105.0, 1700.0, 2)).await.unwrap();

        assert_eq!(store.len(), 1);
        let got = store.get("40.0000,-105.0000").await.unwrap().unwrap();
        assert_eq!(got.sample.elevation(), 1700.0);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let e = entry(1.0, 1.0, 1.0, 1);
        store.put(e.clone()).await.unwrap();

        assert!(store.delete(&e.key).await.unwrap());
        assert!(!store.delete(&e.key).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_older_than_counts_exactly() {
        let store = MemoryStore::new();
        store.put(entry(1.0, 1.0, 1.0, 100)).await.unwrap();
        store.put(entry(2.0, 2.0, 1.0, 200)).await.unwrap();
        store.put(entry(3.0, 3.0, 1.0, 300)).await.unwrap();

        assert_eq!(store.delete_older_than(200).await.unwrap(), 1);
        assert_eq!(store.len(), 2);
        assert!(store.get("1.0000,1.0000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_and_close() {
        let store = MemoryStore::new();
        store.put(entry(1.0, 1.0, 1.0, 1)).await.unwrap();
        store.put(entry(2.0, 2.0, 1.0, 1)).await.unwrap();
        assert_eq!(store.clear().await.unwrap(), 2);

        store.close().await.unwrap();
        assert!(matches!(
            store.put(entry(1.0, 1.0, 1.0, 1)).await,
            Err(StoreError::Closed)
        ));
    }
}
