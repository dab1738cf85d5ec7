//! HT MCS rate tables.

/// Rates in Mbps for HT MCS 0-15, one and two spatial streams.
///
/// Columns: 20 MHz long GI, 20 MHz short GI, 40 MHz long/short,
/// 80 MHz long/short, 160 MHz long/short.
const MCS_TABLE: [[f64; 8]; 16] = [
    [6.5, 7.2, 13.5, 15.0, 29.3, 32.5, 58.5, 65.0],
    [13.0, 14.4, 27.0, 30.0, 58.5, 65.0, 117.0, 130.0],
    [19.5, 21.7, 40.5, 45.0, 87.8, 97.5, 175.5, 195.0],
    [26.0, 28.9, 54.0, 60.0, 117.0, 130.0, 234.0, 260.0],
    [39.0, 43.3, 81.0, 90.0, 175.5, 195.0, 351.0, 390.0],
    [52.0, 57.8, 108.0, 120.0, 234.0, 260.0, 468.0, 520.0],
    [58.5, 65.0, 121.5, 135.0, 263.3, 292.5, 526.5, 585.0],
    [65.0, 72.2, 135.0, 150.0, 292.5, 325.0, 585.0, 650.0],
    [13.0, 14.4, 27.0, 30.0, 58.5, 65.0, 117.0, 130.0],
    [26.0, 28.9, 54.0, 60.0, 117.0, 130.0, 234.0, 260.0],
    [39.0, 43.3, 81.0, 90.0, 175.5, 195.0, 351.0, 390.0],
    [52.0, 57.8, 108.0, 120.0, 234.0, 260.0, 468.0, 520.0],
    [78.0, 86.7, 162.0, 180.0, 351.0, 390.0, 702.0, 780.0],
    [104.0, 115.6, 216.0, 240.0, 468.0, 520.0, 936.0, 1040.0],
    [117.0, 130.3, 243.0, 270.0, 526.5, 585.0, 1053.0, 1170.0],
    [130.0, 144.4, 270.0, 300.0, 585.0, 650.0, 1170.0, 1300.0],
];

/// Highest single-stream MCS index.
const MCS_SINGLE_STREAM_MAX: u8 = 7;

fn column(bw_mhz: u16, short_gi: bool) -> Option<usize> {
    let col = match bw_mhz {
        20 => 0,
        40 => 2,
        80 => 4,
        160 => 6,
        _ => return None,
    };
    Some(col + short_gi as usize)
}

/// Rate in Mbps for an MCS index, bandwidth and guard interval.
///
/// Returns `None` for unknown indices or bandwidths.
pub fn mcs_to_rate(mcs: u8, bw_mhz: u16, short_gi: bool) -> Option<f64> {
    let row = MCS_TABLE.get(mcs as usize)?;
    Some(row[column(bw_mhz, short_gi)?])
}

/// Lowest MCS index whose rate matches `rate_mbps`.
pub fn rate_to_mcs(rate_mbps: f64, bw_mhz: u16, short_gi: bool) -> Option<u8> {
    let col = column(bw_mhz, short_gi)?;
    MCS_TABLE
        .iter()
        .position(|row| (row[col] - rate_mbps).abs() < 1e-3)
        .map(|mcs| mcs as u8)
}

/// Lowest rate of the 20 MHz long GI table.
pub fn is_lowest_rate(rate_mbps: f64) -> bool {
    rate_to_mcs(rate_mbps, 20, false) == Some(0)
}

/// Highest single-stream rate of the 20 MHz long GI table.
pub fn is_highest_rate(rate_mbps: f64) -> bool {
    rate_to_mcs(rate_mbps, 20, false) == Some(MCS_SINGLE_STREAM_MAX)
}

/// Seconds needed to send `len` bytes at `rate_mbps`.
pub fn air_time(len: u32, rate_mbps: f64) -> Option<f64> {
    if rate_mbps > 0.0 && rate_mbps.is_finite() {
        Some(len as f64 * 8.0 / (rate_mbps * 1e6))
    } else {
        None
    }
}
