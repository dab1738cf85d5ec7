//! Error types for wltrace.
//!
//! This module provides structured error types for all trace operations:
//!
//! - [`enum@Error`] - Main error enum returned by the public API
//! - [`CaptureError`] - Fatal errors raised while opening a capture
//! - [`DecodeError`] - Per-record errors; the trace skips the record and continues
//!
//! Recoverable issues that do not reject a record (an unsupported Radiotap
//! field, an undecodable frame body) are attached to the packet as
//! [`Warnings`] instead.

use smallvec::SmallVec;
use thiserror::Error;

/// Main error type for wltrace operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The capture could not be opened or classified
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// A single record could not be decoded and was skipped
    #[error("Record {record} at offset {offset}: {source}")]
    Record {
        record: u64,
        offset: usize,
        #[source]
        source: DecodeError,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error ends the whole trace (as opposed to one skipped record).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Record { .. })
    }

    /// The decode error behind a skipped record.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            Error::Record { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Record number (trace position) of a skipped record.
    pub fn record(&self) -> Option<u64> {
        match self {
            Error::Record { record, .. } => Some(*record),
            _ => None,
        }
    }
}

/// Errors raised while opening a capture. These are fatal for the trace.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Leading magic matches no supported container
    #[error("Unrecognized capture format (magic {magic:02x?})")]
    UnrecognizedFormat { magic: Vec<u8> },

    /// Container header is inconsistent
    #[error("Invalid capture format: {reason}")]
    InvalidFormat { reason: String },

    /// Pcap version other than 2.4
    #[error("Unsupported pcap version {major}.{minor} (expected 2.4)")]
    UnsupportedVersion { major: u16, minor: u16 },

    /// Link type other than 802.11 / 802.11 + Radiotap
    #[error("Unsupported link type: {link_type}")]
    UnsupportedLinkType { link_type: u32 },
}

/// Errors decoding one record. The trace reports them and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A decoder needed more bytes than the record holds
    #[error("Truncated data at offset {offset}: need {needed} bytes, have {available}")]
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Structurally self-contradictory header
    #[error("Malformed frame at offset {offset}: {reason}")]
    MalformedFrame { offset: usize, reason: String },

    /// Recognized but undecodable optional field; only that field is lost
    #[error("Unsupported {field} field (bit {bit})")]
    UnsupportedField { field: &'static str, bit: u32 },
}

impl DecodeError {
    /// Buffer offset the error refers to, when known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            DecodeError::TruncatedData { offset, .. } => Some(*offset),
            DecodeError::MalformedFrame { offset, .. } => Some(*offset),
            DecodeError::UnsupportedField { .. } => None,
        }
    }

    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        DecodeError::MalformedFrame {
            offset,
            reason: reason.into(),
        }
    }
}

/// Recoverable problems attached to a decoded record.
pub type Warnings = SmallVec<[DecodeError; 2]>;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
