//! Persistent storage for elevation samples.
//!
//! - [`ElevationStore`]: keyed put/get/delete over [`CacheEntry`] records
//! - [`MemoryStore`]: volatile, `DashMap`-backed
//! - [`FileStore`]: bincode snapshot on disk, atomically replaced on write

mod file;
mod memory;
mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::{CacheEntry, ElevationStore, StoreError};
