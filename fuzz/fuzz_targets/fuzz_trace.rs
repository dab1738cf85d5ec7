//! Fuzz target for whole-trace decoding.
//!
//! Tests handling of malformed captures including:
//! - Container detection and compressed input
//! - Pcap global and record headers
//! - Peektagged sections and packet tags
//! - ACK window bookkeeping over arbitrary frame sequences

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use wltrace::{Trace, TraceConfig};

fuzz_target!(|data: &[u8]| {
    let config = TraceConfig::default().with_window(8);
    if let Ok(trace) = Trace::from_bytes(Bytes::copy_from_slice(data), config) {
        // Every record yields exactly one item, so this terminates
        for _packet in trace {}
    }
});
