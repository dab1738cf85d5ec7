//! 802.11 MAC header decoder.
//!
//! The header length depends on the frame type, the subtype and the
//! (to_ds, from_ds) addressing mode. The full required length is computed
//! from the frame control field before any address is read, so a short
//! frame is reported as [`DecodeError::MalformedFrame`] instead of a
//! partial header.

use crate::cursor::ByteCursor;
use crate::error::DecodeError;

use super::{ctrl, data, mgmt, subtype_name, FrameType, MacAddr};

/// Frame control flag bits (after the type/subtype byte).
#[allow(dead_code)]
pub mod flags {
    pub const TO_DS: u16 = 0x0100;
    pub const FROM_DS: u16 = 0x0200;
    pub const MORE_FRAG: u16 = 0x0400;
    pub const RETRY: u16 = 0x0800;
    pub const POWER: u16 = 0x1000;
    pub const MORE_DATA: u16 = 0x2000;
    pub const PROTECTED: u16 = 0x4000;
    pub const ORDER: u16 = 0x8000;
}

/// QoS control ack policy values (bits 5-6).
#[allow(dead_code)]
pub mod ack_policy {
    pub const NORMAL: u8 = 0;
    pub const NO_ACK: u8 = 1;
    pub const NO_EXPLICIT: u8 = 2;
    pub const BLOCK_ACK: u8 = 3;
}

/// The 16-bit frame control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameControl(pub u16);

impl FrameControl {
    #[inline]
    pub fn version(&self) -> u8 {
        (self.0 & 0x0003) as u8
    }

    #[inline]
    pub fn frame_type(&self) -> FrameType {
        FrameType::from_bits(((self.0 & 0x000c) >> 2) as u8)
    }

    #[inline]
    pub fn subtype(&self) -> u8 {
        ((self.0 & 0x00f0) >> 4) as u8
    }

    #[inline]
    fn flag(&self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    pub fn to_ds(&self) -> bool {
        self.flag(flags::TO_DS)
    }

    pub fn from_ds(&self) -> bool {
        self.flag(flags::FROM_DS)
    }

    pub fn more_frag(&self) -> bool {
        self.flag(flags::MORE_FRAG)
    }

    pub fn retry(&self) -> bool {
        self.flag(flags::RETRY)
    }

    pub fn power(&self) -> bool {
        self.flag(flags::POWER)
    }

    pub fn more_data(&self) -> bool {
        self.flag(flags::MORE_DATA)
    }

    pub fn protected(&self) -> bool {
        self.flag(flags::PROTECTED)
    }

    pub fn order(&self) -> bool {
        self.flag(flags::ORDER)
    }

    pub fn address_mode(&self) -> AddressMode {
        match (self.to_ds(), self.from_ds()) {
            (false, false) => AddressMode::Direct,
            (false, true) => AddressMode::FromDs,
            (true, false) => AddressMode::ToDs,
            (true, true) => AddressMode::Wds,
        }
    }
}

/// Addressing mode selected by the (to_ds, from_ds) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// 0/0: station to station, or management
    Direct,
    /// 0/1: from the AP to a station
    FromDs,
    /// 1/0: from a station to the AP
    ToDs,
    /// 1/1: four-address mesh / WDS
    Wds,
}

/// Decoded 802.11 MAC header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dot11Header {
    pub fc: FrameControl,
    /// Duration / ID
    pub duration: u16,
    pub addr1: MacAddr,
    pub addr2: Option<MacAddr>,
    pub addr3: Option<MacAddr>,
    pub addr4: Option<MacAddr>,
    pub seq_ctrl: Option<u16>,
    pub qos_ctrl: Option<u16>,
    pub ht_ctrl: Option<u32>,
    /// Bytes consumed by the header; the body starts here.
    pub header_len: usize,
}

/// Header bytes required by a frame control value.
fn required_len(fc: FrameControl) -> usize {
    match fc.frame_type() {
        FrameType::Management => 24 + if fc.order() { 4 } else { 0 },
        FrameType::Data => {
            let qos = fc.subtype() >= data::QOS_DATA;
            let mut len = 24;
            if fc.to_ds() && fc.from_ds() {
                len += 6;
            }
            if qos {
                len += 2;
                if fc.order() {
                    len += 4;
                }
            }
            len
        }
        FrameType::Control => match fc.subtype() {
            ctrl::RTS
            | ctrl::PS_POLL
            | ctrl::BLOCK_ACK_REQ
            | ctrl::BLOCK_ACK
            | ctrl::CF_END
            | ctrl::CF_END_ACK => 16,
            _ => 10,
        },
        FrameType::Extension => 10,
    }
}

fn read_mac(cursor: &mut ByteCursor<'_>) -> Result<MacAddr, DecodeError> {
    Ok(MacAddr(cursor.read_array::<6>()?))
}

impl Dot11Header {
    /// Decode the MAC header at the start of `data`.
    ///
    /// `base` is the absolute offset of `data` in the capture buffer and is
    /// only used for error reporting.
    pub fn parse(data: &[u8], base: usize) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::with_base(data, base);
        if data.len() < 2 {
            return Err(DecodeError::malformed(
                base,
                format!("frame of {} bytes has no frame control", data.len()),
            ));
        }

        let fc = FrameControl(cursor.read_u16()?);
        if fc.version() != 0 {
            return Err(DecodeError::malformed(
                base,
                format!("protocol version {}", fc.version()),
            ));
        }

        let required = required_len(fc);
        if data.len() < required {
            return Err(DecodeError::malformed(
                base,
                format!(
                    "{} {} header needs {} bytes, frame has {}",
                    fc.frame_type(),
                    subtype_name(fc.frame_type(), fc.subtype()),
                    required,
                    data.len()
                ),
            ));
        }

        let duration = cursor.read_u16()?;
        let addr1 = read_mac(&mut cursor)?;
        let mut header = Dot11Header {
            fc,
            duration,
            addr1,
            addr2: None,
            addr3: None,
            addr4: None,
            seq_ctrl: None,
            qos_ctrl: None,
            ht_ctrl: None,
            header_len: 0,
        };

        match fc.frame_type() {
            FrameType::Management => {
                header.addr2 = Some(read_mac(&mut cursor)?);
                header.addr3 = Some(read_mac(&mut cursor)?);
                header.seq_ctrl = Some(cursor.read_u16()?);
                if fc.order() {
                    header.ht_ctrl = Some(cursor.read_u32()?);
                }
            }
            FrameType::Data => {
                header.addr2 = Some(read_mac(&mut cursor)?);
                header.addr3 = Some(read_mac(&mut cursor)?);
                header.seq_ctrl = Some(cursor.read_u16()?);
                if fc.to_ds() && fc.from_ds() {
                    header.addr4 = Some(read_mac(&mut cursor)?);
                }
                if fc.subtype() >= data::QOS_DATA {
                    header.qos_ctrl = Some(cursor.read_u16()?);
                    if fc.order() {
                        header.ht_ctrl = Some(cursor.read_u32()?);
                    }
                }
            }
            FrameType::Control => {
                if required == 16 {
                    header.addr2 = Some(read_mac(&mut cursor)?);
                }
            }
            FrameType::Extension => {}
        }

        header.header_len = cursor.position();
        Ok(header)
    }

    #[inline]
    pub fn frame_type(&self) -> FrameType {
        self.fc.frame_type()
    }

    #[inline]
    pub fn subtype(&self) -> u8 {
        self.fc.subtype()
    }

    pub fn subtype_name(&self) -> &'static str {
        subtype_name(self.frame_type(), self.subtype())
    }

    pub fn address_mode(&self) -> AddressMode {
        self.fc.address_mode()
    }

    /// Sequence number (bits 4-15 of sequence control).
    pub fn seq_num(&self) -> Option<u16> {
        self.seq_ctrl.map(|s| s >> 4)
    }

    /// Fragment number (bits 0-3 of sequence control).
    pub fn frag_num(&self) -> Option<u8> {
        self.seq_ctrl.map(|s| (s & 0x000f) as u8)
    }

    fn has_address_roles(&self) -> bool {
        matches!(
            self.frame_type(),
            FrameType::Management | FrameType::Data
        )
    }

    /// Final destination of the frame.
    pub fn dest(&self) -> Option<MacAddr> {
        if !self.has_address_roles() {
            return Some(self.addr1);
        }
        match self.address_mode() {
            AddressMode::Direct | AddressMode::FromDs => Some(self.addr1),
            AddressMode::ToDs | AddressMode::Wds => self.addr3,
        }
    }

    /// Original source of the frame.
    pub fn src(&self) -> Option<MacAddr> {
        if !self.has_address_roles() {
            return self.addr2;
        }
        match self.address_mode() {
            AddressMode::Direct | AddressMode::ToDs => self.addr2,
            AddressMode::FromDs => self.addr3,
            AddressMode::Wds => self.addr4,
        }
    }

    /// BSS identifier; not carried by four-address or control frames.
    pub fn bssid(&self) -> Option<MacAddr> {
        if !self.has_address_roles() {
            return None;
        }
        match self.address_mode() {
            AddressMode::Direct => self.addr3,
            AddressMode::FromDs => self.addr2,
            AddressMode::ToDs => Some(self.addr1),
            AddressMode::Wds => None,
        }
    }

    /// Station that put the frame on the air (addr2).
    pub fn transmitter(&self) -> Option<MacAddr> {
        self.addr2
    }

    /// Station the frame is addressed to over the air (addr1).
    pub fn receiver(&self) -> MacAddr {
        self.addr1
    }

    pub fn is_management(&self) -> bool {
        self.frame_type() == FrameType::Management
    }

    pub fn is_control(&self) -> bool {
        self.frame_type() == FrameType::Control
    }

    pub fn is_data(&self) -> bool {
        self.frame_type() == FrameType::Data
    }

    pub fn is_ack(&self) -> bool {
        self.is_control() && self.subtype() == ctrl::ACK
    }

    pub fn is_block_ack(&self) -> bool {
        self.is_control() && self.subtype() == ctrl::BLOCK_ACK
    }

    pub fn is_beacon(&self) -> bool {
        self.is_management() && self.subtype() == mgmt::BEACON
    }

    pub fn is_qos_data(&self) -> bool {
        self.is_data() && self.subtype() == data::QOS_DATA
    }

    /// Ack policy from the QoS control field.
    pub fn qos_ack_policy(&self) -> Option<u8> {
        self.qos_ctrl.map(|q| ((q >> 5) & 0x03) as u8)
    }

    /// Whether the receiver is expected to answer with an ACK or block ack.
    ///
    /// Only individually addressed data and management frames are acked,
    /// and not when the sender asked for no acknowledgment.
    pub fn expects_ack(&self) -> bool {
        if !self.has_address_roles() || self.addr2.is_none() || self.addr1.is_group() {
            return false;
        }
        if self.is_management() && self.subtype() == mgmt::ACTION_NO_ACK {
            return false;
        }
        self.qos_ack_policy() != Some(ack_policy::NO_ACK)
    }
}
