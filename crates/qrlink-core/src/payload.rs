//! Payload tags carried in the densely-packed header.

use crate::error::FormatError;

/// How the payload bytes were turned into barcode text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Uppercase hex, no compression, no base32.
    Hex,
    /// Base32, uncompressed.
    Base32,
    /// Deflate-compressed, then base32.
    CompressedBase32,
}

impl Encoding {
    pub fn tag(self) -> char {
        match self {
            Encoding::Hex => 'H',
            Encoding::Base32 => '2',
            Encoding::CompressedBase32 => 'Z',
        }
    }

    pub fn from_tag(tag: char) -> Result<Self, FormatError> {
        match tag {
            'H' => Ok(Encoding::Hex),
            '2' => Ok(Encoding::Base32),
            'Z' => Ok(Encoding::CompressedBase32),
            other => Err(FormatError::UnknownEncoding(other)),
        }
    }
}

/// What the reconstructed bytes mean to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// Partially signed transaction — binary.
    Psbt,
    /// Raw transaction — binary.
    Transaction,
    /// Structured serialized object — UTF-8 text.
    Json,
    /// Plain UTF-8 text.
    Unicode,
}

impl ContentType {
    pub fn tag(self) -> char {
        match self {
            ContentType::Psbt => 'P',
            ContentType::Transaction => 'T',
            ContentType::Json => 'J',
            ContentType::Unicode => 'U',
        }
    }

    pub fn from_tag(tag: char) -> Result<Self, FormatError> {
        match tag {
            'P' => Ok(ContentType::Psbt),
            'T' => Ok(ContentType::Transaction),
            'J' => Ok(ContentType::Json),
            'U' => Ok(ContentType::Unicode),
            other => Err(FormatError::UnknownContentType(other)),
        }
    }

    /// Whether the reconstructed bytes must decode as UTF-8.
    pub fn is_text(self) -> bool {
        matches!(self, ContentType::Json | ContentType::Unicode)
    }
}
