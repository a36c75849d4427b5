//! Location capability types.

use std::time::Duration;

use thiserror::Error;

use crate::BoxFuture;

/// Parameters for a single position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRequest {
    /// Ask for the most accurate fix the platform can give (3D fix with altitude).
    pub high_accuracy: bool,
    /// Upper bound on how long the request may take.
    pub timeout: Duration,
    /// Maximum age of a previously obtained fix that may be reused.
    ///
    /// `Duration::ZERO` demands a fresh fix.
    pub maximum_age: Duration,
}

impl PositionRequest {
    /// A fresh, high-accuracy request.
    pub fn high_accuracy(timeout: Duration) -> Self {
        Self {
            high_accuracy: true,
            timeout,
            maximum_age: Duration::ZERO,
        }
    }

    /// A fresh request that accepts any 2D fix.
    pub fn coarse(timeout: Duration) -> Self {
        Self {
            high_accuracy: false,
            timeout,
            maximum_age: Duration::ZERO,
        }
    }
}

/// A position fix reported by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude in meters, when the fix reports one.
    pub altitude: Option<f64>,
    /// Vertical accuracy in meters, when the fix reports one.
    pub altitude_accuracy: Option<f64>,
    /// When the fix was taken, in epoch milliseconds.
    pub timestamp_ms: i64,
}

/// Failures of the platform location capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("Location permission denied: {0}")]
    PermissionDenied(String),

    #[error("Location information unavailable: {0}")]
    PositionUnavailable(String),

    #[error("Location request timed out")]
    Timeout,

    #[error("Location not supported: {0}")]
    NotSupported(String),
}

/// The platform's location capability.
///
/// Each call produces exactly one outcome. Implementations should respect
/// `request.timeout` themselves; callers additionally bound the call with
/// their own timer.
pub trait LocationProvider: Send + Sync {
    /// Obtains the current position.
    fn current_position(
        &self,
        request: PositionRequest,
    ) -> BoxFuture<'_, Result<PositionFix, PlatformError>>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_constructors() {
        let r = PositionRequest::high_accuracy(Duration::from_secs(10));
        assert!(r.high_accuracy);
        assert_eq!(r.maximum_age, Duration::ZERO);

        let r = PositionRequest::coarse(Duration::from_secs(15));
        assert!(!r.high_accuracy);
        assert_eq!(r.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_platform_error_display() {
        let err = PlatformError::PermissionDenied("socket refused".into());
        assert!(err.to_string().contains("permission denied"));
        assert_eq!(PlatformError::Timeout.to_string(), "Location request timed out");
    }
}
