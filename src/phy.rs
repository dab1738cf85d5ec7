//! Container-independent PHY metadata.
//!
//! [`PhyInfoBuilder`] is fed by the Radiotap or Peektagged decoder and
//! produces one canonical [`PhyInfo`]. Fields a container does not report
//! stay `None`.

use crate::dot11::air_time;
use crate::error::{DecodeError, Warnings};
use crate::pcap::RadiotapInfo;
use crate::peektagged::PeektaggedHeader;

/// PHY metadata of one captured frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhyInfo {
    /// Signal strength in dBm
    pub signal: Option<i32>,
    /// Noise floor in dBm
    pub noise: Option<i32>,
    pub freq_mhz: Option<u16>,
    pub channel: Option<u8>,
    /// Data rate in Mbps
    pub rate: Option<f64>,
    pub mcs: Option<u8>,
    /// Channel width in MHz, when the MCS information reports it
    pub bandwidth: Option<u16>,
    pub short_gi: Option<bool>,
    /// The MAC frame bytes end with a 4-byte FCS
    pub has_fcs: bool,
    /// The capture device flagged the FCS as bad
    pub fcs_error: bool,
    /// On-wire MAC frame length, FCS included
    pub len: u32,
    /// Captured MAC frame length
    pub caplen: u32,
    /// TSF timer in microseconds
    pub mactime: Option<u64>,
    pub ampdu_ref: Option<u32>,
    pub last_frame: bool,
    /// First bit on air, Unix seconds
    pub epoch_ts: f64,
    /// Last bit on air, Unix seconds
    pub end_epoch_ts: f64,
}

impl PhyInfo {
    /// Seconds on air, when the rate is known.
    pub fn air_time(&self) -> Option<f64> {
        self.rate.and_then(|rate| air_time(self.len, rate))
    }

    /// Whether the captured bytes are shorter than the frame on the wire.
    pub fn is_truncated(&self) -> bool {
        self.caplen < self.len
    }

    /// Replace the rate and recompute the end timestamp from the start.
    pub fn set_rate(&mut self, rate: Option<f64>, mcs: Option<u8>) {
        self.rate = rate;
        self.mcs = mcs;
        self.end_epoch_ts = self.epoch_ts + self.air_time().unwrap_or(0.0);
    }
}

/// Which bit of the frame a container timestamp marks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampMark {
    /// Start of reception (pcap convention)
    #[default]
    FirstBit,
    /// End of reception (Peektagged, or pcap with timestamp fixing)
    LastBit,
}

/// Builds a [`PhyInfo`] from container metadata.
#[derive(Debug, Clone, Default)]
pub struct PhyInfoBuilder {
    phy: PhyInfo,
    ts: f64,
    mark: TimestampMark,
}

impl PhyInfoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_radiotap(info: &RadiotapInfo) -> Self {
        let mcs = info.mcs;
        let phy = PhyInfo {
            signal: info.dbm_signal.map(i32::from),
            noise: info.dbm_noise.map(i32::from),
            freq_mhz: info.channel_freq,
            rate: info.data_rate(),
            mcs: mcs.map(|m| m.index),
            bandwidth: mcs.map(|m| m.bandwidth()),
            short_gi: mcs.map(|m| m.short_gi()),
            has_fcs: info.has_fcs(),
            fcs_error: info.bad_fcs(),
            mactime: info.tsft,
            ampdu_ref: info.ampdu.map(|a| a.reference),
            last_frame: info.ampdu.is_some_and(|a| a.is_last()),
            ..Default::default()
        };
        Self {
            phy,
            ..Default::default()
        }
    }

    pub fn from_peektagged(header: &PeektaggedHeader) -> Self {
        let phy = PhyInfo {
            signal: header.signal_dbm,
            noise: header.noise_dbm,
            freq_mhz: header.freq_mhz,
            channel: header.channel,
            rate: header.data_rate(),
            mcs: header.mcs_index(),
            bandwidth: header.mcs_index().map(|_| header.bandwidth()),
            short_gi: header.mcs_index().map(|_| header.short_gi()),
            has_fcs: true,
            fcs_error: header.fcs_error(),
            ..Default::default()
        };
        Self {
            phy,
            ..Default::default()
        }
    }

    /// On-wire and captured MAC frame lengths.
    pub fn lengths(mut self, len: u32, caplen: u32) -> Self {
        self.phy.len = len;
        self.phy.caplen = caplen;
        self
    }

    pub fn timestamp(mut self, epoch_ts: f64, mark: TimestampMark) -> Self {
        self.ts = epoch_ts;
        self.mark = mark;
        self
    }

    /// Finish the record. `offset` locates the record for warnings.
    pub fn build(self, offset: usize, warnings: &mut Warnings) -> PhyInfo {
        let mut phy = self.phy;

        if phy.caplen > phy.len {
            tracing::warn!(
                offset,
                caplen = phy.caplen,
                len = phy.len,
                "captured length exceeds wire length, clamping"
            );
            warnings.push(DecodeError::malformed(
                offset,
                format!(
                    "captured length {} exceeds wire length {}",
                    phy.caplen, phy.len
                ),
            ));
            phy.len = phy.caplen;
        }

        if phy.channel.is_none() {
            phy.channel = phy.freq_mhz.and_then(freq_to_channel);
        }

        let air = phy.air_time().unwrap_or(0.0);
        match self.mark {
            TimestampMark::FirstBit => {
                phy.epoch_ts = self.ts;
                phy.end_epoch_ts = self.ts + air;
            }
            TimestampMark::LastBit => {
                phy.epoch_ts = self.ts - air;
                phy.end_epoch_ts = self.ts;
            }
        }
        phy
    }
}

/// IEEE channel number of a center frequency.
pub fn freq_to_channel(freq_mhz: u16) -> Option<u8> {
    let channel = match freq_mhz {
        2484 => 14,
        2412..=2472 => (freq_mhz - 2407) / 5,
        5955..=7115 => (freq_mhz - 5950) / 5,
        5000..=5950 => (freq_mhz - 5000) / 5,
        4915..=4980 => (freq_mhz - 4000) / 5,
        _ => return None,
    };
    u8::try_from(channel).ok()
}
