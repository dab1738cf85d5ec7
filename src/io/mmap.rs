//! Memory-mapped capture buffers.
//!
//! This module is only available when the `mmap` feature is enabled.
//!
//! Uncompressed captures are mapped directly; compressed captures cannot be
//! decoded in place and are inflated into an owned buffer instead.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use memmap2::Mmap;

use crate::error::Error;

use super::decompress::{inflate, Compression};
use super::{not_found, CaptureBuffer};

/// Map a capture file into memory.
pub fn map_capture<P: AsRef<Path>>(path: P) -> Result<(CaptureBuffer, Compression), Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| not_found(path, e))?;

    // SAFETY: the mapping is read-only and owned by the returned buffer. As
    // with any mmap, truncating the file concurrently is undefined behavior.
    let mmap = unsafe { Mmap::map(&file).map_err(Error::Io)? };

    let compression = Compression::detect(&mmap);
    if compression.is_compressed() {
        let data = inflate(mmap.to_vec(), compression)?;
        return Ok((CaptureBuffer::Owned(Bytes::from(data)), compression));
    }

    Ok((CaptureBuffer::Mapped(Arc::new(mmap)), compression))
}
