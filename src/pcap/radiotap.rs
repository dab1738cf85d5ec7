//! Radiotap header decoder.
//!
//! Layout: `version u8, pad u8, len u16, present u32 [, present u32 ...]`
//! followed by the present fields in bit order. Each field is aligned to
//! its natural boundary measured from the start of the Radiotap header.
//! Fields that are known but not decoded are skipped by width, so a
//! capture with extra metadata still yields the fields we care about.

use smallvec::SmallVec;

use crate::cursor::ByteCursor;
use crate::dot11::mcs_to_rate;
use crate::error::{DecodeError, Warnings};

/// Fixed part of the header: version, pad, length, first present word.
pub const RADIOTAP_MIN_LEN: usize = 8;

/// Radiotap header present flags
#[allow(dead_code)]
pub mod present_flags {
    pub const TSFT: u32 = 1 << 0;
    pub const FLAGS: u32 = 1 << 1;
    pub const RATE: u32 = 1 << 2;
    pub const CHANNEL: u32 = 1 << 3;
    pub const FHSS: u32 = 1 << 4;
    pub const DBM_ANTSIGNAL: u32 = 1 << 5;
    pub const DBM_ANTNOISE: u32 = 1 << 6;
    pub const LOCK_QUALITY: u32 = 1 << 7;
    pub const TX_ATTENUATION: u32 = 1 << 8;
    pub const DB_TX_ATTENUATION: u32 = 1 << 9;
    pub const DBM_TX_POWER: u32 = 1 << 10;
    pub const ANTENNA: u32 = 1 << 11;
    pub const DB_ANTSIGNAL: u32 = 1 << 12;
    pub const DB_ANTNOISE: u32 = 1 << 13;
    pub const RX_FLAGS: u32 = 1 << 14;
    pub const TX_FLAGS: u32 = 1 << 15;
    pub const RTS_RETRIES: u32 = 1 << 16;
    pub const DATA_RETRIES: u32 = 1 << 17;
    pub const XCHANNEL: u32 = 1 << 18;
    pub const MCS: u32 = 1 << 19;
    pub const AMPDU_STATUS: u32 = 1 << 20;
    pub const VHT: u32 = 1 << 21;
    pub const TIMESTAMP: u32 = 1 << 22;
    pub const HE: u32 = 1 << 23;
    pub const HE_MU: u32 = 1 << 24;
    pub const HE_MU_OTHER_USER: u32 = 1 << 25;
    pub const ZERO_LEN_PSDU: u32 = 1 << 26;
    pub const L_SIG: u32 = 1 << 27;
    pub const TLV: u32 = 1 << 28;
    pub const RADIOTAP_NAMESPACE: u32 = 1 << 29;
    pub const VENDOR_NAMESPACE: u32 = 1 << 30;
    pub const EXT: u32 = 1 << 31;
}

/// Flags field bits
#[allow(dead_code)]
pub mod flags {
    pub const CFP: u8 = 0x01;
    pub const SHORT_PREAMBLE: u8 = 0x02;
    pub const WEP: u8 = 0x04;
    pub const FRAGMENTATION: u8 = 0x08;
    pub const FCS: u8 = 0x10;
    pub const DATA_PAD: u8 = 0x20;
    pub const BAD_FCS: u8 = 0x40;
    pub const SHORT_GI: u8 = 0x80;
}

/// Channel flags
#[allow(dead_code)]
pub mod channel_flags {
    pub const TURBO: u16 = 0x0010;
    pub const CCK: u16 = 0x0020;
    pub const OFDM: u16 = 0x0040;
    pub const SPECTRUM_2GHZ: u16 = 0x0080;
    pub const SPECTRUM_5GHZ: u16 = 0x0100;
    pub const PASSIVE: u16 = 0x0200;
    pub const DYN: u16 = 0x0400;
    pub const GFSK: u16 = 0x0800;
}

/// MCS field bits
#[allow(dead_code)]
pub mod mcs_flags {
    pub const KNOWN_BW: u8 = 0x01;
    pub const KNOWN_MCS: u8 = 0x02;
    pub const KNOWN_GI: u8 = 0x04;

    pub const BW_MASK: u8 = 0x03;
    pub const BW_40: u8 = 0x01;
    pub const SHORT_GI: u8 = 0x04;
}

/// A-MPDU status flags
#[allow(dead_code)]
pub mod ampdu_flags {
    pub const REPORT_ZEROLEN: u16 = 0x0001;
    pub const IS_ZEROLEN: u16 = 0x0002;
    pub const LAST_KNOWN: u16 = 0x0004;
    pub const IS_LAST: u16 = 0x0008;
    pub const DELIM_CRC_ERR: u16 = 0x0010;
}

/// (name, alignment, size) of the fields defined in the first namespace.
pub(crate) const FIELDS: [(&str, usize, usize); 28] = [
    ("TSFT", 8, 8),
    ("Flags", 1, 1),
    ("Rate", 1, 1),
    ("Channel", 2, 4),
    ("FHSS", 1, 2),
    ("dBm antenna signal", 1, 1),
    ("dBm antenna noise", 1, 1),
    ("Lock quality", 2, 2),
    ("TX attenuation", 2, 2),
    ("dB TX attenuation", 2, 2),
    ("dBm TX power", 1, 1),
    ("Antenna", 1, 1),
    ("dB antenna signal", 1, 1),
    ("dB antenna noise", 1, 1),
    ("RX flags", 2, 2),
    ("TX flags", 2, 2),
    ("RTS retries", 1, 1),
    ("Data retries", 1, 1),
    ("XChannel", 4, 8),
    ("MCS", 1, 3),
    ("A-MPDU status", 4, 8),
    ("VHT", 2, 12),
    ("Timestamp", 8, 12),
    ("HE", 2, 12),
    ("HE-MU", 2, 12),
    ("HE-MU-other-user", 2, 6),
    ("0-length PSDU", 1, 1),
    ("L-SIG", 2, 4),
];

fn unsupported_name(bit: u32) -> &'static str {
    match bit {
        28 => "TLV",
        29 => "radiotap namespace",
        30 => "vendor namespace",
        _ => "undefined",
    }
}

/// HT MCS field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McsInfo {
    pub known: u8,
    pub flags: u8,
    pub index: u8,
}

impl McsInfo {
    /// Channel width in MHz; 20 unless 40 MHz is reported.
    pub fn bandwidth(&self) -> u16 {
        if self.flags & mcs_flags::BW_MASK == mcs_flags::BW_40 {
            40
        } else {
            20
        }
    }

    pub fn short_gi(&self) -> bool {
        self.flags & mcs_flags::SHORT_GI != 0
    }

    pub fn rate(&self) -> Option<f64> {
        mcs_to_rate(self.index, self.bandwidth(), self.short_gi())
    }
}

/// A-MPDU status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmpduStatus {
    pub reference: u32,
    pub flags: u16,
    pub delim_crc: u8,
}

impl AmpduStatus {
    pub fn is_last(&self) -> bool {
        self.flags & ampdu_flags::IS_LAST != 0
    }
}

/// Decoded Radiotap header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadiotapInfo {
    /// Header length; the MAC frame starts here.
    pub len: usize,
    pub present: SmallVec<[u32; 2]>,
    pub tsft: Option<u64>,
    pub flags: Option<u8>,
    /// Legacy rate in Mbps
    pub rate: Option<f64>,
    pub channel_freq: Option<u16>,
    pub channel_flags: Option<u16>,
    pub dbm_signal: Option<i8>,
    pub dbm_noise: Option<i8>,
    pub antenna: Option<u8>,
    pub mcs: Option<McsInfo>,
    pub ampdu: Option<AmpduStatus>,
}

impl RadiotapInfo {
    /// Decode the Radiotap header at the start of `data`.
    ///
    /// Fields that cannot be walked past are reported in `warnings` and left
    /// absent; the header length still locates the MAC frame.
    pub fn parse(data: &[u8], base: usize, warnings: &mut Warnings) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::with_base(data, base);
        let version = cursor.read_u8()?;
        if version != 0 {
            return Err(DecodeError::malformed(
                base,
                format!("radiotap version {version}"),
            ));
        }
        cursor.skip(1)?;
        let len = cursor.read_u16()? as usize;
        if len < RADIOTAP_MIN_LEN {
            return Err(DecodeError::malformed(
                base,
                format!("radiotap length {len} is shorter than the fixed header"),
            ));
        }
        if len > data.len() {
            return Err(DecodeError::TruncatedData {
                offset: base,
                needed: len,
                available: data.len(),
            });
        }

        // Re-anchor on the declared header so field reads cannot spill into
        // the MAC frame.
        let mut cursor = ByteCursor::with_base(&data[..len], base);
        cursor.skip(4)?;

        let mut info = RadiotapInfo {
            len,
            ..Default::default()
        };
        loop {
            let word = cursor.read_u32()?;
            info.present.push(word);
            if word & present_flags::EXT == 0 {
                break;
            }
        }

        info.walk_fields(&mut cursor, warnings)?;
        Ok(info)
    }

    fn walk_fields(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        warnings: &mut Warnings,
    ) -> Result<(), DecodeError> {
        let present = self.present.clone();
        for (word_idx, word) in present.iter().enumerate() {
            for bit in 0..31u32 {
                if word & (1 << bit) == 0 {
                    continue;
                }
                let field = (word_idx == 0).then(|| FIELDS.get(bit as usize)).flatten();
                let Some(&(name, align, size)) = field else {
                    let field = if word_idx == 0 {
                        unsupported_name(bit)
                    } else {
                        "extended namespace"
                    };
                    warnings.push(DecodeError::UnsupportedField {
                        field,
                        bit: word_idx as u32 * 32 + bit,
                    });
                    return Ok(());
                };

                cursor.align(align)?;
                let mut field_cursor = cursor.sub_cursor(size)?;
                match bit {
                    0 => self.tsft = Some(field_cursor.read_u64()?),
                    1 => self.flags = Some(field_cursor.read_u8()?),
                    2 => self.rate = Some(field_cursor.read_u8()? as f64 * 0.5),
                    3 => {
                        self.channel_freq = Some(field_cursor.read_u16()?);
                        self.channel_flags = Some(field_cursor.read_u16()?);
                    }
                    5 => self.dbm_signal = Some(field_cursor.read_i8()?),
                    6 => self.dbm_noise = Some(field_cursor.read_i8()?),
                    11 => self.antenna = Some(field_cursor.read_u8()?),
                    19 => {
                        self.mcs = Some(McsInfo {
                            known: field_cursor.read_u8()?,
                            flags: field_cursor.read_u8()?,
                            index: field_cursor.read_u8()?,
                        })
                    }
                    20 => {
                        self.ampdu = Some(AmpduStatus {
                            reference: field_cursor.read_u32()?,
                            flags: field_cursor.read_u16()?,
                            delim_crc: field_cursor.read_u8()?,
                        })
                    }
                    _ => tracing::trace!(field = name, "skipping radiotap field"),
                }
            }
        }
        Ok(())
    }

    fn flag(&self, bit: u8) -> bool {
        self.flags.is_some_and(|f| f & bit != 0)
    }

    /// The MAC frame ends with a 4-byte FCS.
    pub fn has_fcs(&self) -> bool {
        self.flag(flags::FCS)
    }

    pub fn bad_fcs(&self) -> bool {
        self.flag(flags::BAD_FCS)
    }

    /// Rate in Mbps. An MCS field takes precedence over the legacy Rate field.
    pub fn data_rate(&self) -> Option<f64> {
        self.mcs.and_then(|m| m.rate()).or(self.rate)
    }
}
