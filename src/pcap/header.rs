//! Pcap global header validation.
//!
//! Headers and records are parsed by `pcap_parser`; this module checks
//! that the capture is one this crate can decode.

use pcap_parser::{parse_pcap_header, PcapHeader as LegacyPcapHeader};

use crate::capture::PcapFlavor;
use crate::error::CaptureError;

pub const PCAP_HEADER_LEN: usize = 24;
pub const RECORD_HEADER_LEN: usize = 16;

/// Bare 802.11 frames.
pub const LINKTYPE_IEEE802_11: u32 = 105;
/// 802.11 frames with a Radiotap prefix.
pub const LINKTYPE_IEEE802_11_RADIOTAP: u32 = 127;

/// Pcap global header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcapHeader {
    pub flavor: PcapFlavor,
    pub version_major: u16,
    pub version_minor: u16,
    /// GMT to local correction, in seconds
    pub thiszone: i32,
    pub sigfigs: u32,
    pub snaplen: u32,
    pub network: u32,
}

impl PcapHeader {
    /// Parse and validate the global header at the start of `data`.
    pub fn parse(data: &[u8], flavor: PcapFlavor) -> Result<Self, CaptureError> {
        let (_, raw) = parse_pcap_header(data).map_err(|e| CaptureError::InvalidFormat {
            reason: format!("pcap global header: {e:?}"),
        })?;
        let header = Self::from_legacy(&raw, flavor);

        if (header.version_major, header.version_minor) != (2, 4) {
            return Err(CaptureError::UnsupportedVersion {
                major: header.version_major,
                minor: header.version_minor,
            });
        }
        if !matches!(
            header.network,
            LINKTYPE_IEEE802_11 | LINKTYPE_IEEE802_11_RADIOTAP
        ) {
            return Err(CaptureError::UnsupportedLinkType {
                link_type: header.network,
            });
        }
        Ok(header)
    }

    fn from_legacy(raw: &LegacyPcapHeader, flavor: PcapFlavor) -> Self {
        PcapHeader {
            flavor,
            version_major: raw.version_major,
            version_minor: raw.version_minor,
            thiszone: raw.thiszone,
            sigfigs: raw.sigfigs,
            snaplen: raw.snaplen,
            network: raw.network.0 as u32,
        }
    }

    pub fn has_radiotap(&self) -> bool {
        self.network == LINKTYPE_IEEE802_11_RADIOTAP
    }

    /// Unix seconds of a record timestamp, corrected by `thiszone`.
    ///
    /// `ts_frac` is in microseconds or nanoseconds, per the capture flavor.
    pub fn epoch_ts(&self, ts_sec: u32, ts_frac: u32) -> f64 {
        let scale = if self.flavor.nanosecond { 1e9 } else { 1e6 };
        ts_sec as f64 + ts_frac as f64 / scale + self.thiszone as f64
    }
}
