//! IEEE 802.11 MAC layer definitions.
//!
//! - [`header`] - MAC header decoding and address role resolution
//! - [`body`] - the few frame bodies decoded beyond the header
//! - [`rate`] - HT MCS rate tables and air time

pub mod body;
pub mod header;
pub mod rate;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::format::{format_mac, parse_mac};

pub use body::{Beacon, BlockAck, FrameBody};
pub use header::{AddressMode, Dot11Header, FrameControl};
pub use rate::{air_time, is_highest_rate, is_lowest_rate, mcs_to_rate, rate_to_mcs};

/// Sequence numbers wrap at 12 bits.
pub const SEQ_NUM_MODULO: u16 = 4096;

/// Frame type (frame control bits 2-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Management,
    Control,
    Data,
    Extension,
}

impl FrameType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => FrameType::Management,
            1 => FrameType::Control,
            2 => FrameType::Data,
            _ => FrameType::Extension,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameType::Management => "Management",
            FrameType::Control => "Control",
            FrameType::Data => "Data",
            FrameType::Extension => "Extension",
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Management frame subtypes.
#[allow(dead_code)]
pub mod mgmt {
    pub const ASSOC_REQ: u8 = 0;
    pub const ASSOC_RESP: u8 = 1;
    pub const REASSOC_REQ: u8 = 2;
    pub const REASSOC_RESP: u8 = 3;
    pub const PROBE_REQ: u8 = 4;
    pub const PROBE_RESP: u8 = 5;
    pub const TIMING_ADV: u8 = 6;
    pub const BEACON: u8 = 8;
    pub const ATIM: u8 = 9;
    pub const DISASSOC: u8 = 10;
    pub const AUTH: u8 = 11;
    pub const DEAUTH: u8 = 12;
    pub const ACTION: u8 = 13;
    pub const ACTION_NO_ACK: u8 = 14;
}

/// Control frame subtypes.
#[allow(dead_code)]
pub mod ctrl {
    pub const CTRL_WRAPPER: u8 = 7;
    pub const BLOCK_ACK_REQ: u8 = 8;
    pub const BLOCK_ACK: u8 = 9;
    pub const PS_POLL: u8 = 10;
    pub const RTS: u8 = 11;
    pub const CTS: u8 = 12;
    pub const ACK: u8 = 13;
    pub const CF_END: u8 = 14;
    pub const CF_END_ACK: u8 = 15;
}

/// Data frame subtypes.
#[allow(dead_code)]
pub mod data {
    pub const DATA: u8 = 0;
    pub const DATA_CF_ACK: u8 = 1;
    pub const DATA_CF_POLL: u8 = 2;
    pub const DATA_CF_ACK_POLL: u8 = 3;
    pub const NULL: u8 = 4;
    pub const CF_ACK: u8 = 5;
    pub const CF_POLL: u8 = 6;
    pub const CF_ACK_POLL: u8 = 7;
    pub const QOS_DATA: u8 = 8;
    pub const QOS_DATA_CF_ACK: u8 = 9;
    pub const QOS_DATA_CF_POLL: u8 = 10;
    pub const QOS_DATA_CF_ACK_POLL: u8 = 11;
    pub const QOS_NULL: u8 = 12;
    pub const QOS_CF_POLL: u8 = 14;
    pub const QOS_CF_ACK_POLL: u8 = 15;
}

/// Display name of a subtype.
pub fn subtype_name(frame_type: FrameType, subtype: u8) -> &'static str {
    match frame_type {
        FrameType::Management => match subtype {
            0 => "Assoc Req",
            1 => "Assoc Resp",
            2 => "Reassoc Req",
            3 => "Reassoc Resp",
            4 => "Probe Req",
            5 => "Probe Resp",
            6 => "Timing Adv",
            8 => "Beacon",
            9 => "ATIM",
            10 => "Disassoc",
            11 => "Auth",
            12 => "Deauth",
            13 => "Action",
            14 => "Action no Ack",
            _ => "Rsvd",
        },
        FrameType::Control => match subtype {
            7 => "Ctrl wrapper",
            8 => "Block Ack req",
            9 => "Block Ack",
            10 => "PS-Poll",
            11 => "RTS",
            12 => "CTS",
            13 => "Ack",
            14 => "CF-End",
            15 => "CF-End + CF-Ack",
            _ => "Rsvd",
        },
        FrameType::Data => match subtype {
            0 => "Data",
            1 => "Data + CF-Ack",
            2 => "Data + CF-Poll",
            3 => "Data + CF-Ack + CF-Poll",
            4 => "Null",
            5 => "CF-Ack",
            6 => "CF-Poll",
            7 => "CF-Ack + CF-Poll",
            8 => "QoS Data",
            9 => "QoS Data + CF-Ack",
            10 => "QoS Data + CF-Poll",
            11 => "QoS Data + CF-Ack + CF-Poll",
            12 => "QoS Null",
            14 => "QoS CF-Poll",
            15 => "QoS CF-Ack + CF-Poll",
            _ => "Rsvd",
        },
        FrameType::Extension => "Extension",
    }
}

/// Next sequence number, wrapping at 4096.
pub fn next_seq(seq: u16) -> u16 {
    (seq + 1) % SEQ_NUM_MODULO
}

const MULTICAST_PREFIXES: [&[u8]; 3] = [&[0x01, 0x00, 0x5e], &[0x33, 0x33], &[0x01, 0x80, 0xc2]];

/// 48-bit IEEE MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    pub fn new(octets: [u8; 6]) -> Self {
        MacAddr(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// IPv4 (`01:00:5e`), IPv6 (`33:33`) or bridge (`01:80:c2`) multicast.
    pub fn is_multicast(&self) -> bool {
        MULTICAST_PREFIXES
            .iter()
            .any(|prefix| self.0.starts_with(prefix))
    }

    /// Broadcast or multicast. Such frames are never acknowledged.
    pub fn is_group(&self) -> bool {
        self.is_broadcast() || self.is_multicast()
    }

    /// Individually addressed, so an acknowledgment is expected.
    pub fn is_unicast(&self) -> bool {
        !self.is_group()
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        MacAddr(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_mac(&self.0))
    }
}

/// Error parsing a textual MAC address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid MAC address: {0}")]
pub struct ParseMacError(pub String);

impl FromStr for MacAddr {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_mac(s)
            .map(MacAddr)
            .ok_or_else(|| ParseMacError(s.to_string()))
    }
}
