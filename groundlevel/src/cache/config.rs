//! Spatial cache configuration.

use std::time::Duration;

use rand::Rng;

/// How long a cached sample may be served.
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How long a cached sample is kept before the sweep removes it.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Maximum planar distance, in degrees, for a nearest-match hit.
pub const DEFAULT_TOLERANCE_DEGREES: f64 = 0.01;

/// Default odds of a sweep after a write.
pub const DEFAULT_SWEEP_ONE_IN: u32 = 100;

/// When a `put` triggers an expiry sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPolicy {
    /// Sweep with probability `1 / one_in` per write.
    Probabilistic { one_in: u32 },
    /// Sweep on every N-th write, counted from cache creation.
    EveryNthWrite(u64),
    /// Only sweep when asked explicitly.
    Never,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        SweepPolicy::Probabilistic {
            one_in: DEFAULT_SWEEP_ONE_IN,
        }
    }
}

impl SweepPolicy {
    /// Builds a probabilistic policy, or `Never` when `one_in` is 0.
    pub fn one_in(one_in: u32) -> Self {
        if one_in == 0 {
            SweepPolicy::Never
        } else {
            SweepPolicy::Probabilistic { one_in }
        }
    }

    /// Decides whether the write numbered `write_count` (1-based) sweeps.
    pub fn should_sweep(&self, write_count: u64) -> bool {
        match *self {
            SweepPolicy::Probabilistic { one_in: 0 } => false,
            SweepPolicy::Probabilistic { one_in } => {
                rand::rng().random_bool(1.0 / f64::from(one_in))
            }
            SweepPolicy::EveryNthWrite(0) => false,
            SweepPolicy::EveryNthWrite(n) => write_count % n == 0,
            SweepPolicy::Never => false,
        }
    }
}

/// Configuration for [`super::SpatialCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub validity: Duration,
    pub retention: Duration,
    pub tolerance_degrees: f64,
    pub sweep_policy: SweepPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            validity: DEFAULT_VALIDITY,
            retention: DEFAULT_RETENTION,
            tolerance_degrees: DEFAULT_TOLERANCE_DEGREES,
            sweep_policy: SweepPolicy::default(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_tolerance(mut self, degrees: f64) -> Self {
        self.tolerance_degrees = degrees;
        self
    }

    pub fn with_sweep_policy(mut self, policy: SweepPolicy) -> Self {
        self.sweep_policy = policy;
        self
    }

    pub(crate) fn validity_ms(&self) -> i64 {
        duration_ms(self.validity)
    }
}

pub(crate) fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
