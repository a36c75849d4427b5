//! Spatially indexed elevation cache.
//!
//! [`SpatialCache`] sits on top of an [`crate::store::ElevationStore`] and
//! adds the two time horizons that govern cached samples:
//!
//! - **validity** (7 days): how long a sample may be served
//! - **retention** (30 days): how long it is kept at all
//!
//! Lookups try the exact 4-decimal fingerprint first, then the nearest fresh
//! entry within a small planar tolerance (0.01°).

mod config;
mod spatial;
mod stats;

pub use config::{
    CacheConfig, SweepPolicy, DEFAULT_RETENTION, DEFAULT_SWEEP_ONE_IN, DEFAULT_TOLERANCE_DEGREES,
    DEFAULT_VALIDITY,
};
pub use spatial::SpatialCache;
pub use stats::CacheStats;
