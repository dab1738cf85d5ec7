//! Capture container detection and the record type shared by the
//! container readers.
//!
//! Detection is a pure function of the first four bytes. Both supported
//! containers have fixed magics:
//!
//! - pcap: `0xa1b2c3d4` (microsecond) or `0xa1b23c4d` (nanosecond), in
//!   either byte order
//! - Peektagged: the `\x7fver` section tag that opens every file

use crate::cursor::Endian;
use crate::error::Warnings;
use crate::phy::PhyInfo;

/// Leading section tag of a Peektagged capture.
pub const PEEKTAGGED_MAGIC: [u8; 4] = *b"\x7fver";

/// Byte order and timestamp resolution of a pcap capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcapFlavor {
    pub endian: Endian,
    /// Record timestamps carry nanoseconds instead of microseconds
    pub nanosecond: bool,
}

/// Capture container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    Pcap(PcapFlavor),
    Peektagged,
    Unrecognized,
}

impl CaptureFormat {
    /// Classify a capture from its first bytes.
    pub fn detect(data: &[u8]) -> Self {
        let pcap = |endian, nanosecond| CaptureFormat::Pcap(PcapFlavor { endian, nanosecond });
        match data {
            [0xd4, 0xc3, 0xb2, 0xa1, ..] => pcap(Endian::Little, false),
            [0xa1, 0xb2, 0xc3, 0xd4, ..] => pcap(Endian::Big, false),
            [0x4d, 0x3c, 0xb2, 0xa1, ..] => pcap(Endian::Little, true),
            [0xa1, 0xb2, 0x3c, 0x4d, ..] => pcap(Endian::Big, true),
            [0x7f, b'v', b'e', b'r', ..] => CaptureFormat::Peektagged,
            _ => CaptureFormat::Unrecognized,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CaptureFormat::Pcap(_) => "pcap",
            CaptureFormat::Peektagged => "peektagged",
            CaptureFormat::Unrecognized => "unrecognized",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, CaptureFormat::Unrecognized)
    }
}

impl std::fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One container record, located but not yet decoded at the MAC layer.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Offset of the record header in the capture buffer
    pub offset: usize,
    /// Offset of the first MAC frame byte
    pub frame_offset: usize,
    /// Captured MAC frame bytes
    pub frame_len: usize,
    pub phy: PhyInfo,
    pub warnings: Warnings,
}

impl RawRecord {
    pub fn frame_range(&self) -> std::ops::Range<usize> {
        self.frame_offset..self.frame_offset + self.frame_len
    }
}
