//! Fuzz target for Radiotap header parsing.
//!
//! Tests present-bitmap chaining, field alignment and the declared length.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wltrace::error::Warnings;
use wltrace::pcap::RadiotapInfo;

fuzz_target!(|data: &[u8]| {
    let mut warnings = Warnings::new();
    if let Ok(info) = RadiotapInfo::parse(data, 0, &mut warnings) {
        assert!(info.len <= data.len());
    }
});
