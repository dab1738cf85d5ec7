//! Capture buffer I/O.
//!
//! A trace is decoded from one contiguous buffer that the trace iterator
//! owns exclusively. The file handle is closed as soon as the buffer is
//! filled (or mapped), so dropping the iterator releases everything.
//!
//! ## Compression Support
//!
//! Compressed captures are inflated transparently:
//! - Gzip (.gz) - always enabled
//! - Zstd (.zst) - `compress-zstd` feature

mod decompress;
#[cfg(feature = "mmap")]
mod mmap;

use std::ops::{Deref, Range};
use std::path::Path;
#[cfg(feature = "mmap")]
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{CaptureError, Error};

pub use decompress::{inflate, inflate_prefix, Compression};
#[cfg(feature = "mmap")]
pub use mmap::map_capture;

/// Capture bytes owned by a trace.
#[derive(Clone, Debug)]
pub enum CaptureBuffer {
    /// Heap buffer; frame slices are zero-copy
    Owned(Bytes),
    /// Memory-mapped file; frame slices are copied out
    #[cfg(feature = "mmap")]
    Mapped(Arc<memmap2::Mmap>),
}

impl CaptureBuffer {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            CaptureBuffer::Owned(bytes) => bytes,
            #[cfg(feature = "mmap")]
            CaptureBuffer::Mapped(mmap) => mmap,
        }
    }

    /// Bytes for `range` that remain valid after the buffer is dropped.
    ///
    /// Panics if `range` is out of bounds, like slice indexing.
    pub fn slice(&self, range: Range<usize>) -> Bytes {
        match self {
            CaptureBuffer::Owned(bytes) => bytes.slice(range),
            #[cfg(feature = "mmap")]
            CaptureBuffer::Mapped(mmap) => Bytes::copy_from_slice(&mmap[range]),
        }
    }
}

impl Deref for CaptureBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

pub(crate) fn not_found(path: &Path, e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::Capture(CaptureError::FileNotFound {
            path: path.display().to_string(),
        })
    } else {
        Error::Io(e)
    }
}

/// Read a whole capture file into memory, inflating it if compressed.
pub fn read_capture<P: AsRef<Path>>(path: P) -> Result<(CaptureBuffer, Compression), Error> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| not_found(path, e))?;

    let compression = Compression::detect(&data);
    let data = inflate(data, compression)?;

    Ok((CaptureBuffer::Owned(Bytes::from(data)), compression))
}
