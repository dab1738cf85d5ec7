//! Peektagged capture container.
//!
//! A file is a sequence of sections, each opened by
//! `{tag [u8; 4], len u32, pad u32}` (little endian):
//!
//! - `\x7fver`: XML `VersionInfo` describing the capturing software
//! - `sess`: XML session information, including the packet count
//! - `pkts`: packet records until end of file; its `len` is not used
//!
//! Each packet record is a tag header ([`PeektaggedHeader`]) followed by
//! the captured MAC frame. The header timestamp marks the last bit of the
//! frame and every frame carries its FCS.

mod header;

use compact_str::CompactString;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::capture::RawRecord;
use crate::cursor::ByteCursor;
use crate::error::{CaptureError, DecodeError, Warnings};
use crate::phy::{PhyInfoBuilder, TimestampMark};

pub use header::{ext_flags, flags, tags, PeektaggedHeader};

pub const SECTION_HEADER_LEN: usize = 12;

/// Section tags.
pub mod section {
    pub const VERSION: [u8; 4] = *b"\x7fver";
    pub const SESSION: [u8; 4] = *b"sess";
    pub const PACKETS: [u8; 4] = *b"pkts";
}

/// Metadata from the sections preceding the packets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeektaggedSession {
    /// `VersionInfo` children, in file order
    pub version_info: Vec<(CompactString, CompactString)>,
    /// Packet count announced by the session section
    pub packet_count: Option<u64>,
}

impl PeektaggedSession {
    pub fn version(&self, key: &str) -> Option<&str> {
        self.version_info
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }
}

fn invalid(reason: impl Into<String>) -> CaptureError {
    CaptureError::InvalidFormat {
        reason: reason.into(),
    }
}

/// Root element name and its direct children as (name, text) pairs.
fn xml_children(
    payload: &[u8],
) -> Result<(CompactString, Vec<(CompactString, CompactString)>), CaptureError> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| invalid(format!("section XML is not UTF-8: {e}")))?
        .trim_end_matches('\0');

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut root = CompactString::default();
    let mut children = Vec::new();
    let mut current: Option<(CompactString, CompactString)> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let name = CompactString::from(String::from_utf8_lossy(e.name().as_ref()));
                match depth {
                    1 => root = name,
                    2 => current = Some((name, CompactString::default())),
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = CompactString::from(String::from_utf8_lossy(e.name().as_ref()));
                match depth {
                    0 => root = name,
                    1 => children.push((name, CompactString::default())),
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                if let (2, Some((_, value))) = (depth, current.as_mut()) {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| invalid(format!("section XML: {e}")))?;
                    value.push_str(&unescaped);
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2 {
                    if let Some(child) = current.take() {
                        children.push(child);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(invalid(format!("section XML: {e}"))),
            Ok(_) => {}
        }
    }

    if root.is_empty() {
        return Err(invalid("section XML has no root element"));
    }
    Ok((root, children))
}

/// Sequential reader over Peektagged packet records.
#[derive(Debug, Clone)]
pub struct PeektaggedReader {
    session: PeektaggedSession,
    pos: usize,
}

impl PeektaggedReader {
    /// Read the leading sections and position at the first packet.
    pub fn new(data: &[u8]) -> Result<Self, CaptureError> {
        let mut cursor = ByteCursor::new(data);
        let mut session = PeektaggedSession::default();

        loop {
            let (tag, len) = Self::section_header(&mut cursor)
                .map_err(|e| invalid(format!("peektagged section header: {e}")))?;
            if tag == section::PACKETS {
                break;
            }

            let payload = cursor
                .read_bytes(len as usize)
                .map_err(|e| invalid(format!("peektagged section payload: {e}")))?;

            match tag {
                section::VERSION => {
                    let (root, children) = xml_children(payload)?;
                    if root.as_str() != "VersionInfo" {
                        return Err(invalid(format!(
                            "version section root is {root}, expected VersionInfo"
                        )));
                    }
                    session.version_info = children;
                }
                section::SESSION => {
                    let (_, children) = xml_children(payload)?;
                    session.packet_count = children
                        .iter()
                        .find(|(k, _)| k.as_str() == "PacketCount")
                        .and_then(|(_, v)| v.trim().parse().ok());
                }
                other => {
                    tracing::debug!(tag = ?other, len, "skipping peektagged section");
                }
            }
        }

        Ok(Self {
            session,
            pos: cursor.position(),
        })
    }

    fn section_header(cursor: &mut ByteCursor<'_>) -> Result<([u8; 4], u32), DecodeError> {
        let tag = cursor.read_array::<4>()?;
        let len = cursor.read_u32()?;
        cursor.skip(4)?;
        Ok((tag, len))
    }

    pub fn session(&self) -> &PeektaggedSession {
        &self.session
    }

    /// Offset of the next packet record.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Locate and decode the next packet record.
    ///
    /// As with pcap, a record that runs past the end of the buffer ends
    /// the reader.
    pub fn next_record(&mut self, data: &[u8]) -> Option<Result<RawRecord, DecodeError>> {
        if self.pos >= data.len() {
            return None;
        }

        let offset = self.pos;
        let mut cursor = ByteCursor::with_base(&data[offset..], offset);
        let located = PeektaggedHeader::parse(&mut cursor).and_then(|header| {
            let frame_offset = cursor.offset();
            cursor.skip(header.caplen as usize)?;
            Ok((header, frame_offset))
        });
        let (header, frame_offset) = match located {
            Ok(located) => located,
            Err(e) => {
                self.pos = data.len();
                return Some(Err(e));
            }
        };
        self.pos = cursor.offset();

        Some(Self::decode_record(offset, frame_offset, &header))
    }

    fn decode_record(
        offset: usize,
        frame_offset: usize,
        header: &PeektaggedHeader,
    ) -> Result<RawRecord, DecodeError> {
        let ts = header
            .epoch_ts()
            .ok_or_else(|| DecodeError::malformed(offset, "packet header has no timestamp"))?;

        let mut warnings = Warnings::new();
        let phy = PhyInfoBuilder::from_peektagged(header)
            .lengths(header.len.unwrap_or(header.caplen), header.caplen)
            .timestamp(ts, TimestampMark::LastBit)
            .build(offset, &mut warnings);

        Ok(RawRecord {
            offset,
            frame_offset,
            frame_len: header.caplen as usize,
            phy,
            warnings,
        })
    }
}
