//! Timestamp conversion.

use chrono::{DateTime, Utc};

/// Seconds between 1601-01-01 (Windows epoch) and 1970-01-01 (Unix epoch).
const WINDOWS_TO_UNIX_SECS: i64 = 11_644_473_600;

/// Convert floating-point Unix seconds to a UTC instant.
///
/// Returns `None` if the value is not finite or is out of chrono's range.
pub fn epoch_to_utc(epoch_ts: f64) -> Option<DateTime<Utc>> {
    if !epoch_ts.is_finite() {
        return None;
    }
    let secs = epoch_ts.floor();
    let nanos = ((epoch_ts - secs) * 1e9).round() as u32;
    // Rounding can carry a full second
    let (secs, nanos) = if nanos >= 1_000_000_000 {
        (secs as i64 + 1, nanos - 1_000_000_000)
    } else {
        (secs as i64, nanos)
    };
    DateTime::from_timestamp(secs, nanos)
}

/// Convert a 64-bit nanosecond count since 1601-01-01 UTC, split in two
/// 32-bit halves, to floating-point Unix seconds.
pub fn filetime_ns_to_unix(high: u32, low: u32) -> f64 {
    let ns = ((high as u64) << 32) | low as u64;
    let secs = (ns / 1_000_000_000) as i64 - WINDOWS_TO_UNIX_SECS;
    let frac = (ns % 1_000_000_000) as f64 / 1e9;
    secs as f64 + frac
}
