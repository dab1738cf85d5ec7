//! Pcap record reader.
//!
//! [`PcapReader`] walks the records of an in-memory pcap capture with
//! `pcap_parser` and decodes each record's Radiotap prefix into PHY
//! metadata. It keeps only the position of the next record; the buffer is
//! passed to every call so the reader can live next to the buffer that
//! owns the bytes.

use pcap_parser::{parse_pcap_frame, parse_pcap_frame_be, LegacyPcapBlock};

use crate::capture::{PcapFlavor, RawRecord};
use crate::cursor::Endian;
use crate::error::{CaptureError, DecodeError, Warnings};
use crate::phy::{PhyInfoBuilder, TimestampMark};

use super::header::{PcapHeader, PCAP_HEADER_LEN, RECORD_HEADER_LEN};
use super::radiotap::RadiotapInfo;

/// Sequential reader over pcap records.
#[derive(Debug, Clone)]
pub struct PcapReader {
    header: PcapHeader,
    pos: usize,
    fix_timestamp: bool,
}

impl PcapReader {
    /// Validate the global header and position at the first record.
    ///
    /// With `fix_timestamp`, record timestamps are taken to mark the end
    /// of the frame and shifted back by its air time.
    pub fn new(data: &[u8], flavor: PcapFlavor, fix_timestamp: bool) -> Result<Self, CaptureError> {
        let header = PcapHeader::parse(data, flavor)?;
        Ok(Self {
            header,
            pos: PCAP_HEADER_LEN,
            fix_timestamp,
        })
    }

    pub fn header(&self) -> &PcapHeader {
        &self.header
    }

    #[inline]
    pub fn link_type(&self) -> u32 {
        self.header.network
    }

    /// Offset of the next record header.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Locate and decode the next record.
    ///
    /// Returns `None` at end of capture. A record whose header or payload
    /// runs past the end of the buffer is reported once, after which the
    /// reader is exhausted: no later record boundary can be trusted.
    pub fn next_record(&mut self, data: &[u8]) -> Option<Result<RawRecord, DecodeError>> {
        let offset = self.pos;
        let rest = data.get(offset..).filter(|rest| !rest.is_empty())?;

        let parsed = match self.header.flavor.endian {
            Endian::Little => parse_pcap_frame(rest),
            Endian::Big => parse_pcap_frame_be(rest),
        };
        let block = match parsed {
            Ok((remaining, block)) => {
                self.pos = data.len() - remaining.len();
                block
            }
            Err(_) => {
                self.pos = data.len();
                return Some(Err(self.truncated(offset, rest)));
            }
        };

        Some(self.decode_record(offset, &block))
    }

    /// Error for a record that does not fit in the rest of the capture.
    fn truncated(&self, offset: usize, rest: &[u8]) -> DecodeError {
        let Some(len) = rest.get(8..12).and_then(|b| <[u8; 4]>::try_from(b).ok()) else {
            return DecodeError::TruncatedData {
                offset,
                needed: RECORD_HEADER_LEN,
                available: rest.len(),
            };
        };
        let incl_len = match self.header.flavor.endian {
            Endian::Little => u32::from_le_bytes(len),
            Endian::Big => u32::from_be_bytes(len),
        };
        DecodeError::TruncatedData {
            offset,
            needed: RECORD_HEADER_LEN + incl_len as usize,
            available: rest.len(),
        }
    }

    fn decode_record(
        &self,
        offset: usize,
        block: &LegacyPcapBlock<'_>,
    ) -> Result<RawRecord, DecodeError> {
        let payload_offset = offset + RECORD_HEADER_LEN;
        let payload = block.data;
        let mut warnings = Warnings::new();

        if block.caplen > self.header.snaplen {
            warnings.push(DecodeError::malformed(
                offset,
                format!(
                    "captured length {} exceeds snaplen {}",
                    block.caplen, self.header.snaplen
                ),
            ));
        }

        let (builder, prefix_len) = if self.header.has_radiotap() {
            let radiotap = RadiotapInfo::parse(payload, payload_offset, &mut warnings)?;
            (PhyInfoBuilder::from_radiotap(&radiotap), radiotap.len)
        } else {
            (PhyInfoBuilder::new(), 0)
        };

        let frame_len = payload.len() - prefix_len;
        let wire_len = (block.origlen as usize).saturating_sub(prefix_len);
        let mark = if self.fix_timestamp {
            TimestampMark::LastBit
        } else {
            TimestampMark::FirstBit
        };

        let phy = builder
            .lengths(wire_len as u32, frame_len as u32)
            .timestamp(self.header.epoch_ts(block.ts_sec, block.ts_usec), mark)
            .build(offset, &mut warnings);

        Ok(RawRecord {
            offset,
            frame_offset: payload_offset + prefix_len,
            frame_len,
            phy,
            warnings,
        })
    }
}
