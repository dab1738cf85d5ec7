//! Value formatting and time conversion utilities.
//!
//! Provides helpers for displaying capture values in human-readable form:
//! - MAC addresses (6 bytes -> colon-separated hex)
//! - Digests and raw bytes (bytes -> lowercase hex)
//! - Timestamps (epoch seconds -> UTC instant, Windows FILETIME -> epoch seconds)

mod address;
mod time;

pub use address::{format_hex, format_mac, parse_mac};
pub use time::{epoch_to_utc, filetime_ns_to_unix};
