//! Compressed capture input.
//!
//! Captures are decoded from one in-memory buffer, so a compressed file is
//! inflated completely before format detection. Only the probe in
//! [`is_packet_trace`](crate::is_packet_trace) stops after a few bytes.

use std::io::{self, Read};

use flate2::read::MultiGzDecoder;

use crate::error::CaptureError;

/// Detected compression format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    #[cfg(feature = "compress-zstd")]
    Zstd,
}

impl Compression {
    /// Detect compression format from magic bytes.
    pub fn detect(data: &[u8]) -> Self {
        match data {
            [0x1f, 0x8b, ..] => Compression::Gzip,
            #[cfg(feature = "compress-zstd")]
            [0x28, 0xb5, 0x2f, 0xfd, ..] => Compression::Zstd,
            _ => Compression::None,
        }
    }

    pub fn is_compressed(&self) -> bool {
        !matches!(self, Compression::None)
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            #[cfg(feature = "compress-zstd")]
            Compression::Zstd => "zstd",
        })
    }
}

/// Inflate a whole capture. Uncompressed input is returned as is.
pub fn inflate(data: Vec<u8>, compression: Compression) -> Result<Vec<u8>, CaptureError> {
    if !compression.is_compressed() {
        return Ok(data);
    }
    let mut out = Vec::with_capacity(data.len().saturating_mul(4));
    inflate_into(&data, compression, usize::MAX, &mut out).map_err(|e| {
        CaptureError::InvalidFormat {
            reason: format!("Failed to decompress {compression} capture: {e}"),
        }
    })?;
    Ok(out)
}

/// At most `limit` inflated bytes from the front of `data`.
///
/// A stream that ends early yields what it had.
pub fn inflate_prefix(data: &[u8], compression: Compression, limit: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(limit);
    inflate_into(data, compression, limit, &mut out)?;
    Ok(out)
}

fn inflate_into(
    data: &[u8],
    compression: Compression,
    limit: usize,
    out: &mut Vec<u8>,
) -> io::Result<()> {
    let limit = u64::try_from(limit).unwrap_or(u64::MAX);
    match compression {
        Compression::None => Read::take(data, limit).read_to_end(out)?,
        // Concatenated members are read as one stream
        Compression::Gzip => MultiGzDecoder::new(data).take(limit).read_to_end(out)?,
        #[cfg(feature = "compress-zstd")]
        Compression::Zstd => zstd::Decoder::new(data)?.take(limit).read_to_end(out)?,
    };
    Ok(())
}
