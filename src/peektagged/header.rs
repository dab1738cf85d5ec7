//! Peektagged per-packet tag header.
//!
//! A packet header is a run of `(tag u16, value u32)` pairs, little endian,
//! terminated by the captured-length tag `0xffff`. The MAC frame follows
//! immediately, with no padding.

use crate::cursor::ByteCursor;
use crate::dot11::mcs_to_rate;
use crate::error::DecodeError;
use crate::format::filetime_ns_to_unix;

/// Packet header tags.
#[allow(dead_code)]
pub mod tags {
    pub const LEN: u16 = 0x0000;
    pub const TS_LOW: u16 = 0x0001;
    pub const TS_HIGH: u16 = 0x0002;
    pub const FLAGS: u16 = 0x0003;
    pub const CHANNEL: u16 = 0x0004;
    pub const RATE: u16 = 0x0005;
    pub const SIGNAL_PERCENT: u16 = 0x0006;
    pub const SIGNAL_DBM: u16 = 0x0007;
    pub const NOISE_PERCENT: u16 = 0x0008;
    pub const NOISE_DBM: u16 = 0x0009;
    pub const FREQ_MHZ: u16 = 0x000d;
    pub const EXT_FLAGS: u16 = 0x0015;
    pub const CAPLEN: u16 = 0xffff;
}

/// `FLAGS` tag bits.
pub mod flags {
    pub const FCS_ERROR: u32 = 0x0002;
}

/// `EXT_FLAGS` tag bits.
#[allow(dead_code)]
pub mod ext_flags {
    pub const BANDWIDTH_MASK: u32 = 0x0007;
    pub const BW_40: u32 = 0x0004;
    pub const GI_MASK: u32 = 0x0018;
    pub const SHORT_GI: u32 = 0x0008;
    pub const MCS_INDEX_USED: u32 = 0x0100;
}

/// Decoded packet tag header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeektaggedHeader {
    /// On-wire length, FCS included
    pub len: Option<u32>,
    pub ts_low: Option<u32>,
    pub ts_high: Option<u32>,
    pub flags: u32,
    pub channel: Option<u8>,
    /// 0.5 Mbps units, or an MCS index when `MCS_INDEX_USED` is set
    pub rate: Option<u32>,
    pub signal_percent: Option<u32>,
    pub signal_dbm: Option<i32>,
    pub noise_percent: Option<u32>,
    pub noise_dbm: Option<i32>,
    pub freq_mhz: Option<u16>,
    pub ext_flags: u32,
    pub caplen: u32,
}

impl PeektaggedHeader {
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let mut header = PeektaggedHeader::default();
        loop {
            let tag = cursor.read_u16()?;
            let value = cursor.read_u32()?;
            match tag {
                tags::LEN => header.len = Some(value),
                tags::TS_LOW => header.ts_low = Some(value),
                tags::TS_HIGH => header.ts_high = Some(value),
                tags::FLAGS => header.flags = value,
                tags::CHANNEL => header.channel = u8::try_from(value).ok(),
                tags::RATE => header.rate = Some(value),
                tags::SIGNAL_PERCENT => header.signal_percent = Some(value),
                tags::SIGNAL_DBM => header.signal_dbm = Some(value as i32),
                tags::NOISE_PERCENT => header.noise_percent = Some(value),
                tags::NOISE_DBM => header.noise_dbm = Some(value as i32),
                tags::FREQ_MHZ => header.freq_mhz = u16::try_from(value).ok(),
                tags::EXT_FLAGS => header.ext_flags = value,
                tags::CAPLEN => {
                    header.caplen = value;
                    return Ok(header);
                }
                _ => {}
            }
        }
    }

    pub fn fcs_error(&self) -> bool {
        self.flags & flags::FCS_ERROR != 0
    }

    pub fn mcs_index(&self) -> Option<u8> {
        if self.ext_flags & ext_flags::MCS_INDEX_USED == 0 {
            return None;
        }
        self.rate.and_then(|r| u8::try_from(r).ok())
    }

    pub fn bandwidth(&self) -> u16 {
        if self.ext_flags & ext_flags::BW_40 != 0 {
            40
        } else {
            20
        }
    }

    pub fn short_gi(&self) -> bool {
        self.ext_flags & ext_flags::SHORT_GI != 0
    }

    /// Rate in Mbps; `None` when absent, zero, or an unknown MCS.
    pub fn data_rate(&self) -> Option<f64> {
        let rate = match self.mcs_index() {
            Some(mcs) => mcs_to_rate(mcs, self.bandwidth(), self.short_gi())?,
            None if self.ext_flags & ext_flags::MCS_INDEX_USED != 0 => return None,
            None => self.rate? as f64 / 2.0,
        };
        (rate > 0.0).then_some(rate)
    }

    /// End-of-frame instant in Unix seconds.
    pub fn epoch_ts(&self) -> Option<f64> {
        Some(filetime_ns_to_unix(self.ts_high?, self.ts_low?))
    }
}
