//! # wltrace
//!
//! Decoding of 802.11 wireless packet traces.
//!
//! A trace is a capture file in one of the supported containers. Each
//! record is decoded into a [`Packet`]: the MAC header, container
//! independent PHY metadata, selected frame bodies and, when frames can
//! be paired with their acknowledgments, whether each was acked.
//!
//! ## Features
//!
//! - **Containers**: pcap (both byte orders, micro and nanosecond) with
//!   Radiotap or bare 802.11 link types, and Peektagged
//! - **Compression**: gzip always, zstd with the `compress-zstd` feature
//! - **Memory-Mapped I/O**: `mmap` feature
//! - **ACK inference**: ACKs and block acks are matched to the frames
//!   they answer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wltrace::Trace;
//!
//! let trace = Trace::open("capture.pcap").unwrap();
//! for packet in trace {
//!     match packet {
//!         Ok(packet) => println!(
//!             "{} {} {:?}",
//!             packet.counter,
//!             packet.header.subtype_name(),
//!             packet.acked
//!         ),
//!         Err(e) if !e.is_fatal() => eprintln!("skipped: {e}"),
//!         Err(e) => return eprintln!("{e}"),
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  trace/       - Trace iterator, ACK window, A-MPDU rate back-fill   |
//! |  ack/         - ACK / block ack inference                           |
//! |  packet/      - Packet, RawFrame, SHA-256 digest                    |
//! |  dot11/       - MAC header, frame bodies, rate tables               |
//! |  phy/         - Container-independent PHY metadata                  |
//! |  pcap/        - pcap records and Radiotap                           |
//! |  peektagged/  - Peektagged sections and packet tags                 |
//! |  capture/     - Container detection                                 |
//! |  io/          - Capture buffers, mmap, decompression                |
//! |  cursor/      - Bounds-checked byte reads                           |
//! |  format/      - Address, hex and timestamp formatting               |
//! |  error/       - Error types                                         |
//! +---------------------------------------------------------------------+
//! ```

pub mod ack;
pub mod capture;
pub mod cursor;
pub mod dot11;
pub mod error;
pub mod format;
pub mod io;
pub mod packet;
pub mod pcap;
pub mod peektagged;
pub mod phy;
pub mod trace;

#[cfg(test)]
mod test_utils;

pub use ack::{AckInference, AckMatch, MAX_ACK_LATENCY_US};
pub use capture::{CaptureFormat, PcapFlavor, RawRecord};
pub use dot11::{Dot11Header, FrameBody, FrameType, MacAddr};
pub use error::{CaptureError, DecodeError, Error, Result, Warnings};
pub use io::{CaptureBuffer, Compression};
pub use packet::{Digest, Packet, RawFrame};
pub use phy::PhyInfo;
pub use trace::{is_packet_trace, Trace, TraceConfig, DEFAULT_WINDOW};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
