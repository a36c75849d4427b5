//! Core traits for elevation persistence.
//!
//! The [`ElevationStore`] trait is a small keyed store for [`CacheEntry`]
//! records. It knows nothing about spatial lookup or validity windows; that
//! logic lives in [`crate::cache::SpatialCache`], which is built directly on
//! top of it.
//!
//! # Design Principles
//!
//! - **String keys**: the coordinate fingerprint, readable in logs
//! - **Last write wins**: `put` replaces any entry with the same key
//! - **Dyn-compatible**: `Pin<Box<dyn Future>>` so the store can be shared
//!   as `Arc<dyn ElevationStore>`

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sample::ElevationSample;
use crate::BoxFuture;

/// A persisted elevation sample keyed by its coordinate fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Coordinate fingerprint (see [`crate::coord::cache_key`]).
    pub key: String,
    /// The stored observation with its original provenance.
    pub sample: ElevationSample,
    /// When the entry was written, epoch milliseconds.
    pub stored_at: i64,
}

impl CacheEntry {
    /// Builds an entry for `sample`, keyed by its own coordinates.
    pub fn new(sample: ElevationSample, stored_at: i64) -> Self {
        let key = crate::coord::cache_key(sample.latitude(), sample.longitude());
        Self {
            key,
            sample,
            stored_at,
        }
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error while reading or writing the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The store has been closed.
    #[error("Store is closed")]
    Closed,
}

/// Durable keyed storage for elevation entries.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; concurrent `put`s to the same key
/// must leave exactly one of the written entries in place.
pub trait ElevationStore: Send + Sync {
    /// Insert or replace the entry under `entry.key`.
    fn put(&self, entry: CacheEntry) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Fetch the entry stored under `key`.
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<CacheEntry>, StoreError>>;

    /// Snapshot of every stored entry, in no particular order.
    fn get_all(&self) -> BoxFuture<'_, Result<Vec<CacheEntry>, StoreError>>;

    /// Remove the entry under `key`. Returns whether it existed.
    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>>;

    /// Remove every entry observed strictly before `cutoff_ms`.
    ///
    /// Returns the number of entries removed.
    fn delete_older_than(&self, cutoff_ms: i64) -> BoxFuture<'_, Result<usize, StoreError>>;

    /// Remove everything. Returns the number of entries removed.
    fn clear(&self) -> BoxFuture<'_, Result<usize, StoreError>>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Whether the store holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush and release the store. Later operations fail with
    /// [`StoreError::Closed`].
    fn close(&self) -> BoxFuture<'_, Result<(), StoreError>>;
}
