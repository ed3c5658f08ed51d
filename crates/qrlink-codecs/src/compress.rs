//! Deflate collaborator for the densely-packed scheme.
//!
//! Failures surface as `CompressionError`, never as a raw I/O error — a
//! failed compress must never silently emit uncompressed data under the
//! compressed tag.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompressionError {
    #[error("compression failed: {0}")]
    Compress(String),
    #[error("decompression failed: {0}")]
    Decompress(String),
}

/// Raw-deflate compress.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(data)
        .map_err(|e| CompressionError::Compress(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CompressionError::Compress(e.to_string()))
}

/// Raw-deflate decompress.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut out = Vec::new();
    DeflateDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| CompressionError::Decompress(e.to_string()))?;
    Ok(out)
}
