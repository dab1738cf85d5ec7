//! Synthetic capture fixtures for integration tests.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

pub const AP: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
pub const STA: [u8; 6] = [0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb];

/// Beacon from `AP` announcing `ssid`.
pub fn beacon(ssid: &str) -> Vec<u8> {
    let mut frame = vec![0x80, 0x00, 0x00, 0x00];
    frame.extend_from_slice(&[0xff; 6]); // DA
    frame.extend_from_slice(&AP); // SA
    frame.extend_from_slice(&AP); // BSSID
    frame.extend_from_slice(&[0x00, 0x00]); // Seq
    frame.extend_from_slice(&0x0102030405060708u64.to_le_bytes()); // Timestamp
    frame.extend_from_slice(&100u16.to_le_bytes()); // Interval
    frame.extend_from_slice(&0x0411u16.to_le_bytes()); // Capabilities
    frame.push(0); // SSID element
    frame.push(ssid.len() as u8);
    frame.extend_from_slice(ssid.as_bytes());
    frame.extend_from_slice(&[1, 2, 0x82, 0x84]); // Supported rates
    frame
}

/// Data frame from `STA` to `AP` (ToDS).
pub fn data_to_ap(seq: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0x08, 0x01, 0x2c, 0x00];
    frame.extend_from_slice(&AP); // BSSID
    frame.extend_from_slice(&STA); // SA
    frame.extend_from_slice(&[0xff; 6]); // DA
    frame.extend_from_slice(&(seq << 4).to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// ACK addressed to `ra`.
pub fn ack(ra: [u8; 6]) -> Vec<u8> {
    let mut frame = vec![0xd4, 0x00, 0x00, 0x00];
    frame.extend_from_slice(&ra);
    frame
}

/// Radiotap header with Flags and Rate (0.5 Mbps units).
pub fn radiotap(flags: u8, rate: u8) -> Vec<u8> {
    let mut header = vec![0x00, 0x00, 10, 0x00];
    header.extend_from_slice(&0x0000_0006u32.to_le_bytes());
    header.push(flags);
    header.push(rate);
    header
}

/// Pcap capture; records are (ts_sec, ts_usec, payload).
pub fn pcap(link_type: u32, records: &[(u32, u32, Vec<u8>)]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&0xa1b2c3d4u32.to_le_bytes());
    data.extend_from_slice(&2u16.to_le_bytes());
    data.extend_from_slice(&4u16.to_le_bytes());
    data.extend_from_slice(&0i32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&65535u32.to_le_bytes());
    data.extend_from_slice(&link_type.to_le_bytes());
    for (sec, usec, payload) in records {
        data.extend_from_slice(&sec.to_le_bytes());
        data.extend_from_slice(&usec.to_le_bytes());
        data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(payload);
    }
    data
}

/// Big-endian nanosecond pcap capture; records are (ts_sec, ts_nsec, payload).
pub fn pcap_be_nanos(link_type: u32, records: &[(u32, u32, Vec<u8>)]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&0xa1b23c4du32.to_be_bytes());
    data.extend_from_slice(&2u16.to_be_bytes());
    data.extend_from_slice(&4u16.to_be_bytes());
    data.extend_from_slice(&0i32.to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(&65535u32.to_be_bytes());
    data.extend_from_slice(&link_type.to_be_bytes());
    for (sec, nsec, payload) in records {
        data.extend_from_slice(&sec.to_be_bytes());
        data.extend_from_slice(&nsec.to_be_bytes());
        data.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        data.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        data.extend_from_slice(payload);
    }
    data
}

fn section(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(payload);
}

/// Peektagged capture; packets are (end-of-frame ns since 1601, rate, frame).
pub fn peektagged(packets: &[(u64, u32, Vec<u8>)]) -> Vec<u8> {
    let mut data = Vec::new();
    section(
        &mut data,
        b"\x7fver",
        b"<VersionInfo><AppVersion>9.1</AppVersion><FileVersion>7</FileVersion></VersionInfo>",
    );
    let session = format!(
        "<Session><PacketCount>{}</PacketCount></Session>",
        packets.len()
    );
    section(&mut data, b"sess", session.as_bytes());
    section(&mut data, b"pkts", &[]);

    for (ts, rate, frame) in packets {
        let tags: [(u16, u32); 7] = [
            (0x0000, frame.len() as u32),
            (0x0001, *ts as u32),
            (0x0002, (*ts >> 32) as u32),
            (0x0003, 0),
            (0x0004, 6),
            (0x0005, *rate),
            (0xffff, frame.len() as u32),
        ];
        for (tag, value) in tags {
            data.extend_from_slice(&tag.to_le_bytes());
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(frame);
    }
    data
}

/// Unix seconds as nanoseconds since 1601.
pub fn filetime_ns(unix_secs: u64, nanos: u64) -> u64 {
    (unix_secs + 11_644_473_600) * 1_000_000_000 + nanos
}

pub fn write_temp(data: &[u8], suffix: &str) -> NamedTempFile {
    let mut temp = NamedTempFile::with_suffix(suffix).unwrap();
    temp.write_all(data).unwrap();
    temp.flush().unwrap();
    temp
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}
