//! Decoded packets.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use ring::digest::{digest, SHA256};

use crate::capture::RawRecord;
use crate::dot11::{Dot11Header, FrameBody, MacAddr};
use crate::error::{DecodeError, Warnings};
use crate::format::{epoch_to_utc, format_hex};
use crate::io::CaptureBuffer;
use crate::phy::PhyInfo;

const FCS_LEN: usize = 4;

/// SHA-256 of the raw MAC frame bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    pub fn of(data: &[u8]) -> Self {
        let mut out = [0u8; 32];
        out.copy_from_slice(digest(&SHA256, data).as_ref());
        Digest(out)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_hex(&self.0))
    }
}

/// MAC frame bytes and where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Offset of the first MAC byte in the (decompressed) capture
    pub offset: usize,
    pub data: Bytes,
    /// On-wire length
    pub len: u32,
    /// Captured length; `data.len()`
    pub caplen: u32,
}

/// One decoded 802.11 frame.
#[derive(Debug, Clone)]
pub struct Packet {
    /// 1-based record position in the trace
    pub counter: u64,
    pub frame: RawFrame,
    pub header: Dot11Header,
    pub phy: PhyInfo,
    pub body: Option<FrameBody>,
    pub digest: Digest,
    /// `None` for frames that are never acknowledged (control frames,
    /// group addressed frames, no-ack policies).
    pub acked: Option<bool>,
    /// Counter of the acknowledging packet
    pub ack_pkt: Option<u64>,
    pub warnings: Warnings,
}

impl Packet {
    /// Decode the MAC frame a container record points at.
    pub fn decode(
        counter: u64,
        record: RawRecord,
        buffer: &CaptureBuffer,
    ) -> Result<Packet, DecodeError> {
        let RawRecord {
            frame_offset,
            frame_len,
            phy,
            mut warnings,
            ..
        } = record;

        let data = buffer.slice(frame_offset..frame_offset + frame_len);
        let header = Dot11Header::parse(&data, frame_offset)?;

        let fcs_len = if phy.has_fcs { FCS_LEN } else { 0 };
        let body_end = data.len().min((phy.len as usize).saturating_sub(fcs_len));
        let body = if header.header_len <= body_end {
            let body_bytes = &data[header.header_len..body_end];
            match FrameBody::parse(&header, body_bytes, frame_offset + header.header_len) {
                Ok(body) => body,
                Err(e) => {
                    warnings.push(e);
                    None
                }
            }
        } else {
            None
        };

        let acked = header.expects_ack().then_some(false);
        let digest = Digest::of(&data);

        Ok(Packet {
            counter,
            frame: RawFrame {
                offset: frame_offset,
                len: phy.len,
                caplen: data.len() as u32,
                data,
            },
            header,
            phy,
            body,
            digest,
            acked,
            ack_pkt: None,
            warnings,
        })
    }

    /// Start of the frame, as Unix seconds.
    #[inline]
    pub fn epoch_ts(&self) -> f64 {
        self.phy.epoch_ts
    }

    /// End of the frame, as Unix seconds.
    #[inline]
    pub fn end_epoch_ts(&self) -> f64 {
        self.phy.end_epoch_ts
    }

    pub fn ts(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.phy.epoch_ts)
    }

    pub fn end_ts(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.phy.end_epoch_ts)
    }

    pub fn src(&self) -> Option<MacAddr> {
        self.header.src()
    }

    pub fn dest(&self) -> Option<MacAddr> {
        self.header.dest()
    }

    pub fn air_time(&self) -> Option<f64> {
        self.phy.air_time()
    }

    pub fn is_ack(&self) -> bool {
        self.header.is_ack()
    }

    pub fn is_block_ack(&self) -> bool {
        self.header.is_block_ack()
    }

    pub fn is_beacon(&self) -> bool {
        self.header.is_beacon()
    }
}
