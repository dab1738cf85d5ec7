//! Fuzz target for 802.11 MAC header and body parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wltrace::dot11::{Dot11Header, FrameBody};

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = Dot11Header::parse(data, 0) {
        let _ = header.src();
        let _ = header.dest();
        let _ = header.bssid();
        let _ = header.expects_ack();
        let _ = FrameBody::parse(&header, &data[header.header_len..], header.header_len);
    }
});
