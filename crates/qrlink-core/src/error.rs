//! Error taxonomy shared across the qrlink crates.
//!
//! The split matters for recovery policy: a `FormatError` rejects one part
//! and leaves the session alone, an `IntegrityError` fails the whole session,
//! a `CodecError` fails the final payload decode after reassembly succeeded.

use crate::payload::{ContentType, Encoding};

/// A single part's framing is malformed. Rejecting it never corrupts any
/// other in-progress session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("part shorter than the 8-character header")]
    HeaderTooShort,

    #[error("unknown encoding tag: {0:?}")]
    UnknownEncoding(char),

    #[error("unknown content-type tag: {0:?}")]
    UnknownContentType(char),

    #[error("invalid base-36 field: {0:?}")]
    BadBase36(String),

    #[error("part index {index} not below declared total {total}")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("malformed part marker: {0:?}")]
    BadMarker(String),

    #[error("part declares total {found}, session expects {expected}")]
    TotalMismatch { expected: usize, found: usize },

    #[error("part encoding tag {found:?} disagrees with session tag {expected:?}")]
    EncodingMismatch { expected: Encoding, found: Encoding },

    #[error("part content-type tag {found:?} disagrees with session tag {expected:?}")]
    ContentTypeMismatch {
        expected: ContentType,
        found: ContentType,
    },
}

/// Two parts claimed the same index with different content. The session is
/// unrecoverable; the caller must restart the read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("conflicting duplicate: part {index} already held with different content")]
pub struct IntegrityError {
    pub index: usize,
}

/// Payload decode failed after reassembly completed. Reported distinctly
/// from `FormatError` because the parts themselves were well-formed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("invalid base32 symbol: {0:?}")]
    InvalidBase32(char),

    #[error("invalid hex payload: {0}")]
    InvalidHex(String),

    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("declared text payload is not valid UTF-8")]
    InvalidUtf8,
}

/// A size budget was violated before any fragmentation work began.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    #[error("value {0} outside the base-36 header range 0..=1295")]
    Base36Range(u32),

    #[error("capacity {capacity} leaves no room for the {header}-character header")]
    NoPayloadRoom { capacity: usize, header: usize },

    #[error("part size budget is zero")]
    ZeroPartSize,
}

/// A fountain-decoded message declared a semantic type the dispatch table
/// does not know. Surfaced, never silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported payload type: {0:?}")]
pub struct UnsupportedType(pub String);
