//! File-backed elevation store.
//!
//! Entries live in memory and every mutation rewrites a bincode snapshot on
//! disk. Snapshots are written to a sibling `.tmp` file and renamed into
//! place, so a crash mid-write leaves the previous snapshot intact. A put
//! whose snapshot write fails is rolled back in memory as well.

use std::collections::HashMap;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::traits::{CacheEntry, ElevationStore, StoreError};
use crate::BoxFuture;

/// Snapshot format version. Bump when [`CacheEntry`] changes shape.
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    entries: Vec<CacheEntry>,
}

/// Durable store persisted to a single snapshot file.
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, CacheEntry>>,
    // Serializes snapshot writes so renames land in mutation order.
    write_lock: Mutex<()>,
    closed: AtomicBool,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// A missing file yields an empty store. An unreadable or corrupt
    /// snapshot is logged and discarded; the next write replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match load_snapshot(&path) {
            Ok(Some(entries)) => {
                info!(path = %path.display(), entries = entries.len(), "Loaded elevation cache");
                entries
            }
            Ok(None) => {
                debug!(path = %path.display(), "No elevation cache file, starting empty");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding unreadable elevation cache");
                HashMap::new()
            }
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    /// Undo a put whose snapshot write failed, unless a later put has
    /// already replaced the entry.
    fn roll_back(&self, key: String, inserted: &CacheEntry, previous: Option<CacheEntry>) {
        let mut entries = self.entries.write();
        if entries.get(&key) != Some(inserted) {
            return;
        }
        match previous {
            Some(previous) => {
                entries.insert(key, previous);
            }
            None => {
                entries.remove(&key);
            }
        }
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            entries: self.entries.read().values().cloned().collect(),
        };
        let bytes = bincode::serialize(&snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, bytes).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> Result<Option<HashMap<String, CacheEntry>>, StoreError> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let snapshot: Snapshot = bincode::deserialize_from(BufReader::new(file))
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(StoreError::Serialization(format!(
            "unsupported snapshot version {}",
            snapshot.version
        )));
    }

    Ok(Some(
        snapshot
            .entries
            .into_iter()
            .map(|entry| (entry.key.clone(), entry))
            .collect(),
    ))
}

impl ElevationStore for FileStore {
    fn put(&self, entry: CacheEntry) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.ensure_open()?;
            let key = entry.key.clone();
            let previous = self.entries.write().insert(key.clone(), entry.clone());
            if let Err(e) = self.persist().await {
                self.roll_back(key, &entry, previous);
                return Err(e);
            }
            Ok(())
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<CacheEntry>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            self.ensure_open()?;
            Ok(self.entries.read().get(&key).cloned())
        })
    }

    fn get_all(&self) -> BoxFuture<'_, Result<Vec<CacheEntry>, StoreError>> {
        Box::pin(async move {
            self.ensure_open()?;
            Ok(self.entries.read().values().cloned().collect())
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            self.ensure_open()?;
            let existed = self.entries.write().remove(&key).is_some();
            if existed {
                self.persist().await?;
            }
            Ok(existed)
        })
    }

    fn delete_older_than(&self, cutoff_ms: i64) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            self.ensure_open()?;
            let removed = {
                let mut entries = self.entries.write();
                let before = entries.len();
                entries.retain(|_, entry| entry.sample.observed_at() >= cutoff_ms);
                before - entries.len()
            };
            if removed > 0 {
                self.persist().await?;
            }
            Ok(removed)
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            self.ensure_open()?;
            let removed = {
                let mut entries = self.entries.write();
                let removed = entries.len();
                entries.clear();
                removed
            };
            self.persist().await?;
            Ok(removed)
        })
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn close(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            if self.closed.swap(true, Ordering::AcqRel) {
                return Ok(());
            }
            self.persist().await
        })
    }
}
