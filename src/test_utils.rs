//! Test utilities for capture decoding.
//!
//! Provides builders for constructing 802.11 frames, Radiotap headers and
//! whole pcap or Peektagged captures in memory.

use crate::pcap::radiotap::FIELDS;
use crate::pcap::LINKTYPE_IEEE802_11_RADIOTAP;
use crate::peektagged::tags;

pub const STA_A: [u8; 6] = [0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x01];
pub const STA_B: [u8; 6] = [0xbb, 0xbb, 0xbb, 0xbb, 0xbb, 0x02];
pub const STA_C: [u8; 6] = [0xcc, 0xcc, 0xcc, 0xcc, 0xcc, 0x03];

/// Builder for 802.11 MAC frames.
#[derive(Debug, Clone)]
pub struct Dot11Builder {
    fc: [u8; 2],
    duration: u16,
    addr1: [u8; 6],
    addr2: Option<[u8; 6]>,
    addr3: Option<[u8; 6]>,
    seq_ctrl: Option<u16>,
    qos_ctrl: Option<u16>,
    payload: Vec<u8>,
}

impl Dot11Builder {
    fn with_fc(fc0: u8) -> Self {
        Self {
            fc: [fc0, 0x00],
            duration: 0x002c,
            addr1: STA_B,
            addr2: Some(STA_A),
            addr3: Some(STA_C),
            seq_ctrl: Some(0x0010),
            qos_ctrl: None,
            payload: Vec::new(),
        }
    }

    /// Data frame from A to B.
    pub fn data() -> Self {
        Self::with_fc(0x08)
    }

    /// QoS data frame from A to B with the given ack policy.
    pub fn qos_data(ack_policy: u8) -> Self {
        let mut builder = Self::with_fc(0x88);
        builder.qos_ctrl = Some((ack_policy as u16 & 0x03) << 5);
        builder
    }

    /// Beacon from C to broadcast.
    pub fn beacon() -> Self {
        let mut builder = Self::with_fc(0x80);
        builder.addr1 = [0xff; 6];
        builder.addr2 = Some(STA_C);
        builder
    }

    pub fn ack(ra: [u8; 6]) -> Self {
        Self {
            fc: [0xd4, 0x00],
            duration: 0,
            addr1: ra,
            addr2: None,
            addr3: None,
            seq_ctrl: None,
            qos_ctrl: None,
            payload: Vec::new(),
        }
    }

    /// Compressed block ack from `ta` to `ra`.
    pub fn block_ack(ra: [u8; 6], ta: [u8; 6], start_seq: u16, bitmap: u64) -> Self {
        let mut payload = Vec::with_capacity(12);
        payload.extend_from_slice(&0x0004u16.to_le_bytes());
        payload.extend_from_slice(&(start_seq << 4).to_le_bytes());
        payload.extend_from_slice(&bitmap.to_le_bytes());
        Self {
            fc: [0x94, 0x00],
            duration: 0,
            addr1: ra,
            addr2: Some(ta),
            addr3: None,
            seq_ctrl: None,
            qos_ctrl: None,
            payload,
        }
    }

    pub fn addr1(mut self, addr: [u8; 6]) -> Self {
        self.addr1 = addr;
        self
    }

    pub fn addr2(mut self, addr: [u8; 6]) -> Self {
        self.addr2 = Some(addr);
        self
    }

    pub fn addr3(mut self, addr: [u8; 6]) -> Self {
        self.addr3 = Some(addr);
        self
    }

    pub fn flags(mut self, flags: u8) -> Self {
        self.fc[1] = flags;
        self
    }

    pub fn seq(mut self, seq: u16) -> Self {
        self.seq_ctrl = Some(seq << 4);
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(26 + self.payload.len());
        frame.extend_from_slice(&self.fc);
        frame.extend_from_slice(&self.duration.to_le_bytes());
        frame.extend_from_slice(&self.addr1);
        if let Some(addr) = self.addr2 {
            frame.extend_from_slice(&addr);
        }
        if let Some(addr) = self.addr3 {
            frame.extend_from_slice(&addr);
        }
        if let Some(seq) = self.seq_ctrl {
            frame.extend_from_slice(&seq.to_le_bytes());
        }
        if let Some(qos) = self.qos_ctrl {
            frame.extend_from_slice(&qos.to_le_bytes());
        }
        frame.extend_from_slice(&self.payload);
        frame
    }
}

/// Builder for Radiotap headers with a single present word.
#[derive(Debug, Clone, Default)]
pub struct RadiotapBuilder {
    fields: Vec<(u32, Vec<u8>)>,
}

impl RadiotapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field by present bit; it is placed in bit order and aligned.
    pub fn raw_field(mut self, bit: u32, value: &[u8]) -> Self {
        self.fields.push((bit, value.to_vec()));
        self
    }

    pub fn tsft(self, tsft: u64) -> Self {
        self.raw_field(0, &tsft.to_le_bytes())
    }

    pub fn flags(self, flags: u8) -> Self {
        self.raw_field(1, &[flags])
    }

    /// Legacy rate in 0.5 Mbps units.
    pub fn rate(self, rate: u8) -> Self {
        self.raw_field(2, &[rate])
    }

    pub fn channel(self, freq_mhz: u16, flags: u16) -> Self {
        let mut value = freq_mhz.to_le_bytes().to_vec();
        value.extend_from_slice(&flags.to_le_bytes());
        self.raw_field(3, &value)
    }

    pub fn dbm_signal(self, dbm: i8) -> Self {
        self.raw_field(5, &[dbm as u8])
    }

    pub fn dbm_noise(self, dbm: i8) -> Self {
        self.raw_field(6, &[dbm as u8])
    }

    pub fn mcs(self, known: u8, flags: u8, index: u8) -> Self {
        self.raw_field(19, &[known, flags, index])
    }

    pub fn ampdu(self, reference: u32, flags: u16) -> Self {
        let mut value = reference.to_le_bytes().to_vec();
        value.extend_from_slice(&flags.to_le_bytes());
        value.extend_from_slice(&[0, 0]);
        self.raw_field(20, &value)
    }

    pub fn build(mut self) -> Vec<u8> {
        self.fields.sort_by_key(|(bit, _)| *bit);
        let present = self.fields.iter().fold(0u32, |acc, (bit, _)| acc | (1 << bit));

        let mut header = vec![0, 0, 0, 0];
        header.extend_from_slice(&present.to_le_bytes());
        for (bit, value) in &self.fields {
            let align = FIELDS.get(*bit as usize).map_or(1, |f| f.1);
            while header.len() % align != 0 {
                header.push(0);
            }
            header.extend_from_slice(value);
        }
        let len = header.len() as u16;
        header[2..4].copy_from_slice(&len.to_le_bytes());
        header
    }
}

/// Builder for little-endian microsecond pcap captures.
#[derive(Debug, Clone)]
pub struct PcapBuilder {
    link_type: u32,
    snaplen: u32,
    records: Vec<u8>,
}

impl Default for PcapBuilder {
    fn default() -> Self {
        Self {
            link_type: LINKTYPE_IEEE802_11_RADIOTAP,
            snaplen: 65535,
            records: Vec::new(),
        }
    }
}

impl PcapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link_type(mut self, link_type: u32) -> Self {
        self.link_type = link_type;
        self
    }

    pub fn snaplen(mut self, snaplen: u32) -> Self {
        self.snaplen = snaplen;
        self
    }

    pub fn record(mut self, ts_sec: u32, ts_usec: u32, payload: &[u8]) -> Self {
        let len = payload.len() as u32;
        self.records.extend_from_slice(&ts_sec.to_le_bytes());
        self.records.extend_from_slice(&ts_usec.to_le_bytes());
        self.records.extend_from_slice(&len.to_le_bytes());
        self.records.extend_from_slice(&len.to_le_bytes());
        self.records.extend_from_slice(payload);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut data = Vec::with_capacity(24 + self.records.len());
        data.extend_from_slice(&0xa1b2c3d4u32.to_le_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&self.snaplen.to_le_bytes());
        data.extend_from_slice(&self.link_type.to_le_bytes());
        data.extend_from_slice(&self.records);
        data
    }
}

/// Builder for Peektagged captures.
///
/// Always emits a version section; the session section only when a packet
/// count is set. The `pkts` section header is the last thing before the
/// packet records.
#[derive(Debug, Clone, Default)]
pub struct PeektaggedBuilder {
    version_info: Vec<(String, String)>,
    packet_count: Option<u64>,
    packets: Vec<u8>,
}

fn section(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(payload);
}

/// Unix seconds to nanoseconds since 1601, split in (high, low).
fn filetime_ns(epoch_ts: f64) -> (u32, u32) {
    let secs = epoch_ts.floor();
    let nanos = ((epoch_ts - secs) * 1e9).round() as u64;
    let ns = (secs as u64 + 11_644_473_600) * 1_000_000_000 + nanos;
    ((ns >> 32) as u32, ns as u32)
}

impl PeektaggedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version_info(mut self, entries: &[(&str, &str)]) -> Self {
        self.version_info = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    pub fn packet_count(mut self, count: u64) -> Self {
        self.packet_count = Some(count);
        self
    }

    /// Packet whose last bit is at `epoch_ts`, at `rate` in 0.5 Mbps.
    pub fn packet(self, epoch_ts: f64, rate: u32, frame: &[u8]) -> Self {
        let (high, low) = filetime_ns(epoch_ts);
        self.packet_with_tags(
            &[
                (tags::LEN, frame.len() as u32),
                (tags::TS_LOW, low),
                (tags::TS_HIGH, high),
                (tags::FLAGS, 0),
                (tags::RATE, rate),
                (tags::SIGNAL_DBM, (-50i32) as u32),
            ],
            frame,
        )
    }

    /// Packet with explicit tags; the captured-length tag is appended.
    pub fn packet_with_tags(mut self, pairs: &[(u16, u32)], frame: &[u8]) -> Self {
        for (tag, value) in pairs {
            self.packets.extend_from_slice(&tag.to_le_bytes());
            self.packets.extend_from_slice(&value.to_le_bytes());
        }
        self.packets.extend_from_slice(&tags::CAPLEN.to_le_bytes());
        self.packets
            .extend_from_slice(&(frame.len() as u32).to_le_bytes());
        self.packets.extend_from_slice(frame);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut data = Vec::new();

        let mut xml = String::from("<VersionInfo>");
        for (key, value) in &self.version_info {
            xml.push_str(&format!("<{key}>{value}</{key}>"));
        }
        xml.push_str("</VersionInfo>");
        section(&mut data, b"\x7fver", xml.as_bytes());

        if let Some(count) = self.packet_count {
            let xml = format!("<Session><PacketCount>{count}</PacketCount></Session>");
            section(&mut data, b"sess", xml.as_bytes());
        }

        section(&mut data, b"pkts", &[]);
        data.extend_from_slice(&self.packets);
        data
    }
}
