//! Frame bodies decoded beyond the MAC header.
//!
//! Only beacons (fixed fields and SSID) and block acks (control field and
//! compressed bitmap) are decoded. Body decoding is best effort: the caller
//! turns an error into a packet warning and keeps the frame.

use compact_str::CompactString;

use crate::cursor::ByteCursor;
use crate::error::DecodeError;

use super::{ctrl, mgmt, Dot11Header, FrameType};

/// Information element IDs.
#[allow(dead_code)]
pub mod element {
    pub const SSID: u8 = 0;
    pub const SUPPORTED_RATES: u8 = 1;
    pub const DS_PARAMETER: u8 = 3;
    pub const TIM: u8 = 5;
}

/// Block ack control field bits.
#[allow(dead_code)]
pub mod ba_control {
    pub const POLICY: u16 = 0x0001;
    pub const MULTI_TID: u16 = 0x0002;
    pub const COMPRESSED: u16 = 0x0004;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameBody {
    Beacon(Beacon),
    BlockAck(BlockAck),
}

impl FrameBody {
    /// Decode the body of a frame whose header is already parsed.
    ///
    /// `body` excludes the header and any FCS trailer. Returns `Ok(None)`
    /// for frames whose body is not decoded.
    pub fn parse(
        header: &Dot11Header,
        body: &[u8],
        base: usize,
    ) -> Result<Option<FrameBody>, DecodeError> {
        match (header.frame_type(), header.subtype()) {
            (FrameType::Management, mgmt::BEACON) => {
                Beacon::parse(body, base).map(|b| Some(FrameBody::Beacon(b)))
            }
            // Control field follows the TA address
            (FrameType::Control, ctrl::BLOCK_ACK) => {
                BlockAck::parse(body, base).map(|b| Some(FrameBody::BlockAck(b)))
            }
            _ => Ok(None),
        }
    }

    pub fn as_beacon(&self) -> Option<&Beacon> {
        match self {
            FrameBody::Beacon(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_block_ack(&self) -> Option<&BlockAck> {
        match self {
            FrameBody::BlockAck(b) => Some(b),
            _ => None,
        }
    }
}

/// Beacon fixed fields plus the SSID element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    /// TSF of the transmitting station, in microseconds
    pub timestamp: u64,
    /// Beacon interval in time units (1024 µs)
    pub interval: u16,
    pub capabilities: u16,
    /// Absent if the SSID element is missing or truncated
    pub ssid: Option<CompactString>,
}

impl Beacon {
    pub fn parse(body: &[u8], base: usize) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::with_base(body, base);
        let timestamp = cursor.read_u64()?;
        let interval = cursor.read_u16()?;
        let capabilities = cursor.read_u16()?;

        let mut ssid = None;
        while cursor.remaining() >= 2 {
            let id = cursor.read_u8()?;
            let len = cursor.read_u8()? as usize;
            let Ok(value) = cursor.read_bytes(len) else {
                break;
            };
            if id == element::SSID {
                ssid = Some(CompactString::from(String::from_utf8_lossy(value)));
                break;
            }
        }

        Ok(Beacon {
            timestamp,
            interval,
            capabilities,
            ssid,
        })
    }
}

/// Block ack control and, for compressed single-TID acks, the bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockAck {
    pub control: u16,
    pub start_seq: Option<u16>,
    pub start_frag: Option<u8>,
    pub bitmap: Option<u64>,
}

impl BlockAck {
    /// Parse from the byte right after the TA address.
    pub fn parse(body: &[u8], base: usize) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::with_base(body, base);
        let control = cursor.read_u16()?;
        let mut ba = BlockAck {
            control,
            start_seq: None,
            start_frag: None,
            bitmap: None,
        };

        if ba.compressed() && !ba.multi_tid() {
            let seq_ctrl = cursor.read_u16()?;
            ba.start_seq = Some(seq_ctrl >> 4);
            ba.start_frag = Some((seq_ctrl & 0x000f) as u8);
            ba.bitmap = Some(cursor.read_u64()?);
        }
        Ok(ba)
    }

    /// No-ack ack policy bit.
    pub fn policy(&self) -> bool {
        self.control & ba_control::POLICY != 0
    }

    pub fn multi_tid(&self) -> bool {
        self.control & ba_control::MULTI_TID != 0
    }

    pub fn compressed(&self) -> bool {
        self.control & ba_control::COMPRESSED != 0
    }

    pub fn tid(&self) -> u8 {
        (self.control >> 12) as u8
    }

    /// Whether the bitmap acknowledges `seq`, if it covers it.
    pub fn acks(&self, seq: u16) -> Option<bool> {
        let start = self.start_seq?;
        let bitmap = self.bitmap?;
        let delta = seq.wrapping_sub(start) % super::SEQ_NUM_MODULO;
        if delta >= 64 {
            return None;
        }
        Some(bitmap & (1u64 << delta) != 0)
    }
}
