//! Coordinate handling module
//!
//! Provides validated geographic coordinates, the quantized fingerprint used
//! to key cache entries, and the planar degree-space distance used for
//! nearest-neighbour cache lookups.

mod types;

pub use types::{
    is_valid_latitude, is_valid_longitude, CoordError, Coordinate, MAX_LAT, MAX_LON, MIN_LAT,
    MIN_LON,
};

/// Number of decimal places kept by the cache fingerprint.
///
/// Four decimals is roughly an 11m grid at the equator.
pub const KEY_DECIMALS: i32 = 4;

const KEY_SCALE: f64 = 10_000.0;

/// Quantizes a coordinate component to the fingerprint grid.
#[inline]
fn quantize(value: f64) -> i64 {
    (value * KEY_SCALE).round() as i64
}

/// Renders a quantized component as a fixed four-decimal string.
fn format_quantized(q: i64) -> String {
    let sign = if q < 0 { "-" } else { "" };
    let abs = q.unsigned_abs();
    format!("{}{}.{:04}", sign, abs / 10_000, abs % 10_000)
}

/// Computes the cache fingerprint for a coordinate.
///
/// The key is `"{lat},{lon}"` with both components rounded to four decimal
/// places. Rounding happens on integers, so feeding an already-rounded
/// coordinate back in always yields the same key.
///
/// # Example
///
/// ```
/// use groundlevel::coord::cache_key;
///
/// assert_eq!(cache_key(40.71284, -74.00601), "40.7128,-74.0060");
/// ```
pub fn cache_key(lat: f64, lon: f64) -> String {
    format!(
        "{},{}",
        format_quantized(quantize(lat)),
        format_quantized(quantize(lon))
    )
}

/// Euclidean distance between two coordinates in degree space.
///
/// This is deliberately not a great-circle distance: the cache tolerance is
/// small enough that the planar approximation is used as-is.
#[inline]
pub fn planar_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat_diff = lat1 - lat2;
    let lon_diff = lon1 - lon2;
    (lat_diff * lat_diff + lon_diff * lon_diff).sqrt()
}
