//! Pcap container with optional Radiotap prefix.
//!
//! - [`PcapReader`] - `pcap_parser` record walk producing [`RawRecord`](crate::capture::RawRecord)s
//! - [`RadiotapInfo`] - Radiotap header decoder
//! - [`PcapHeader`] - global header and link type validation

pub mod header;
pub mod radiotap;
mod reader;

pub use header::{
    PcapHeader, LINKTYPE_IEEE802_11, LINKTYPE_IEEE802_11_RADIOTAP, PCAP_HEADER_LEN,
    RECORD_HEADER_LEN,
};
pub use radiotap::{AmpduStatus, McsInfo, RadiotapInfo};
pub use reader::PcapReader;
