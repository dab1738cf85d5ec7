//! Trace iteration.
//!
//! [`Trace`] opens a capture, picks the container reader from the leading
//! magic and yields one `Result<Packet, Error>` per record, in file order.
//!
//! Packets pass through a small reorder-free window before they are
//! yielded. The window lets later records update earlier ones:
//!
//! - an ACK or block ack marks the frames it answers as acked
//! - the last subframe of an A-MPDU lends its rate to the earlier
//!   subframes, which usually carry none
//!
//! A packet leaves the window once nothing can change it any more, or when
//! the window is full.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::Bytes;

use crate::ack::{AckInference, MAX_ACK_LATENCY_US};
use crate::capture::{CaptureFormat, RawRecord};
use crate::error::{CaptureError, DecodeError, Error, Result};
use crate::io::{inflate, inflate_prefix, read_capture, CaptureBuffer, Compression};
use crate::packet::Packet;
use crate::pcap::PcapReader;
use crate::peektagged::{PeektaggedReader, PeektaggedSession};
use crate::phy::PhyInfo;

/// Default number of packets held back for ACK inference.
pub const DEFAULT_WINDOW: usize = 64;

/// Bytes read from the front of a file to classify it.
const PROBE_LEN: u64 = 4096;

/// Configuration for trace decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceConfig {
    /// Treat pcap timestamps as end-of-frame and shift them back by air time
    pub fix_timestamp: bool,
    /// Pair ACKs with the frames they acknowledge
    pub infer_acks: bool,
    /// Longest accepted gap between a frame and its ACK
    pub max_ack_latency_us: u64,
    /// Packets held back at most
    pub window: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            fix_timestamp: false,
            infer_acks: true,
            max_ack_latency_us: MAX_ACK_LATENCY_US,
            window: DEFAULT_WINDOW,
        }
    }
}

impl TraceConfig {
    pub fn with_fix_timestamp(mut self, fix_timestamp: bool) -> Self {
        self.fix_timestamp = fix_timestamp;
        self
    }

    pub fn with_infer_acks(mut self, infer_acks: bool) -> Self {
        self.infer_acks = infer_acks;
        self
    }

    pub fn with_max_ack_latency_us(mut self, us: u64) -> Self {
        self.max_ack_latency_us = us;
        self
    }

    /// A window of zero yields every packet as soon as it is decoded.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }
}

/// Container reader for the detected format.
#[derive(Debug, Clone)]
enum Container {
    Pcap(PcapReader),
    Peektagged(PeektaggedReader),
}

impl Container {
    fn next_record(&mut self, data: &[u8]) -> Option<std::result::Result<RawRecord, DecodeError>> {
        match self {
            Container::Pcap(reader) => reader.next_record(data),
            Container::Peektagged(reader) => reader.next_record(data),
        }
    }

    fn position(&self) -> usize {
        match self {
            Container::Pcap(reader) => reader.position(),
            Container::Peektagged(reader) => reader.position(),
        }
    }
}

/// Counter of a windowed slot. Only per-record errors enter the window.
fn slot_counter(slot: &Result<Packet>) -> Option<u64> {
    match slot {
        Ok(packet) => Some(packet.counter),
        Err(e) => e.record(),
    }
}

/// Iterator over the packets of a capture.
#[derive(Debug)]
pub struct Trace {
    buffer: CaptureBuffer,
    format: CaptureFormat,
    compression: Compression,
    container: Container,
    config: TraceConfig,
    acks: AckInference,
    window: VecDeque<Result<Packet>>,
    records_read: u64,
    open_ampdu: Option<u32>,
    exhausted: bool,
}

impl Trace {
    /// Open a capture file with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, TraceConfig::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, config: TraceConfig) -> Result<Self> {
        let (buffer, compression) = read_capture(path)?;
        Self::from_buffer(buffer, compression, config)
    }

    /// Open a capture file through a memory map.
    #[cfg(feature = "mmap")]
    pub fn open_mmap<P: AsRef<Path>>(path: P, config: TraceConfig) -> Result<Self> {
        let (buffer, compression) = crate::io::map_capture(path)?;
        Self::from_buffer(buffer, compression, config)
    }

    /// Decode a capture already in memory; compressed input is inflated.
    pub fn from_bytes(data: Bytes, config: TraceConfig) -> Result<Self> {
        let compression = Compression::detect(&data);
        let data = if compression.is_compressed() {
            Bytes::from(inflate(data.to_vec(), compression)?)
        } else {
            data
        };
        Self::from_buffer(CaptureBuffer::Owned(data), compression, config)
    }

    fn from_buffer(
        buffer: CaptureBuffer,
        compression: Compression,
        config: TraceConfig,
    ) -> Result<Self> {
        let format = CaptureFormat::detect(&buffer);
        let container = match format {
            CaptureFormat::Pcap(flavor) => {
                Container::Pcap(PcapReader::new(&buffer, flavor, config.fix_timestamp)?)
            }
            CaptureFormat::Peektagged => Container::Peektagged(PeektaggedReader::new(&buffer)?),
            CaptureFormat::Unrecognized => {
                let magic = buffer[..buffer.len().min(4)].to_vec();
                return Err(CaptureError::UnrecognizedFormat { magic }.into());
            }
        };

        tracing::debug!(
            format = %format.name(),
            compression = %compression,
            len = buffer.len(),
            "opened trace"
        );

        Ok(Self {
            buffer,
            format,
            compression,
            container,
            config,
            acks: AckInference::new(config.max_ack_latency_us),
            window: VecDeque::with_capacity(config.window + 1),
            records_read: 0,
            open_ampdu: None,
            exhausted: false,
        })
    }

    pub fn format(&self) -> CaptureFormat {
        self.format
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Pcap link type; `None` for Peektagged captures.
    pub fn link_type(&self) -> Option<u32> {
        match &self.container {
            Container::Pcap(reader) => Some(reader.link_type()),
            Container::Peektagged(_) => None,
        }
    }

    /// Peektagged session metadata.
    pub fn session(&self) -> Option<&PeektaggedSession> {
        match &self.container {
            Container::Peektagged(reader) => Some(reader.session()),
            Container::Pcap(_) => None,
        }
    }

    /// Records pulled from the container so far, including skipped ones.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Pull one record into the window.
    fn pull(&mut self) {
        let offset = self.container.position();
        let Some(record) = self.container.next_record(self.buffer.as_slice()) else {
            tracing::debug!(records = self.records_read, "end of trace");
            self.exhausted = true;
            self.open_ampdu = None;
            self.acks.clear();
            return;
        };

        self.records_read += 1;
        let counter = self.records_read;
        match record.and_then(|record| Packet::decode(counter, record, &self.buffer)) {
            Ok(packet) => {
                tracing::trace!(
                    counter,
                    subtype = packet.header.subtype_name(),
                    len = packet.phy.len,
                    "decoded packet"
                );
                self.admit(packet);
            }
            Err(source) => {
                tracing::warn!(record = counter, offset, error = %source, "skipping record");
                self.window.push_back(Err(Error::Record {
                    record: counter,
                    offset,
                    source,
                }));
            }
        }
    }

    fn admit(&mut self, packet: Packet) {
        match packet.phy.ampdu_ref {
            Some(reference) if packet.phy.last_frame => {
                self.backfill(reference, &packet.phy);
                self.open_ampdu = None;
            }
            Some(reference) => self.open_ampdu = Some(reference),
            None => self.open_ampdu = None,
        }

        if self.config.infer_acks {
            if let Some(matched) = self.acks.observe(&packet) {
                for counter in matched.acked {
                    if let Some(acked) = self.packet_mut(counter) {
                        acked.acked = Some(true);
                        acked.ack_pkt = Some(matched.ack);
                    }
                }
            }
        }

        self.window.push_back(Ok(packet));
    }

    /// Give earlier subframes of an A-MPDU the rate of its last subframe.
    fn backfill(&mut self, reference: u32, last: &PhyInfo) {
        if last.rate.is_none() {
            return;
        }
        for packet in self.window.iter_mut().filter_map(|slot| slot.as_mut().ok()) {
            if packet.phy.ampdu_ref == Some(reference) && !packet.phy.last_frame {
                packet.phy.set_rate(last.rate, last.mcs);
            }
        }
    }

    fn packet_mut(&mut self, counter: u64) -> Option<&mut Packet> {
        let front = slot_counter(self.window.front()?)?;
        let index = usize::try_from(counter.checked_sub(front)?).ok()?;
        self.window.get_mut(index)?.as_mut().ok()
    }

    /// Whether the front slot can be yielded.
    fn front_ready(&self) -> bool {
        let Some(front) = self.window.front() else {
            return false;
        };
        if self.exhausted || self.window.len() > self.config.window {
            return true;
        }
        match front {
            Err(_) => true,
            Ok(packet) => {
                let in_open_ampdu =
                    packet.phy.ampdu_ref.is_some() && packet.phy.ampdu_ref == self.open_ampdu;
                !in_open_ampdu && !self.acks.is_pending(packet.counter)
            }
        }
    }

    fn pop_front(&mut self) -> Option<Result<Packet>> {
        let slot = self.window.pop_front()?;
        if let Ok(packet) = &slot {
            self.acks.forget(packet.counter);
        }
        Some(slot)
    }
}

impl Iterator for Trace {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.front_ready() {
                return self.pop_front();
            }
            if self.exhausted {
                return None;
            }
            self.pull();
        }
    }
}

/// Whether `path` looks like a capture this crate can decode.
pub fn is_packet_trace<P: AsRef<Path>>(path: P) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut head = Vec::new();
    if file.take(PROBE_LEN).read_to_end(&mut head).is_err() {
        return false;
    }

    let compression = Compression::detect(&head);
    let head = if compression.is_compressed() {
        match inflate_prefix(&head, compression, 4) {
            Ok(head) => head,
            Err(_) => return false,
        }
    } else {
        head
    };
    CaptureFormat::detect(&head).is_recognized()
}
