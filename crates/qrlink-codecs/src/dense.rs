//! Densely-packed framing — the binary-friendly scheme.
//!
//! A part is an 8-character header followed by a slice of the encoded
//! payload text:
//!
//! ```text
//! B$  Z  P  0A  03  KRSGS4ZA...
//! │   │  │  │   └── part index, 2 × base-36, zero-based
//! │   │  │  └────── total parts, 2 × base-36
//! │   │  └───────── content-type tag
//! │   └──────────── encoding tag
//! └──────────────── fixed marker
//! ```
//!
//! Part sizing is two-pass: parts are kept maximally full under the
//! per-barcode capacity ceiling while staying 8-character aligned, so each
//! non-final slice decodes to a whole number of bytes on its own.

use qrlink_core::error::{CapacityError, CodecError, FormatError};
use qrlink_core::header::{base36_pair, base36_parse, BASE36_MAX};
use qrlink_core::payload::{ContentType, Encoding};
use qrlink_core::{base32, capacity};

use bytes::Bytes;

use crate::compress::{self, CompressionError};
use crate::PayloadContent;

/// Fixed two-character marker opening every part.
pub const MARKER: &str = "B$";

/// Header length in characters.
pub const HEADER_LEN: usize = 8;

/// Above this payload size, always keep the compressed form. Holding both
/// copies to compare lengths risks memory exhaustion on constrained
/// devices, and compression is asymptotically beneficial at this scale.
pub const ALWAYS_COMPRESS_THRESHOLD: usize = 5000;

/// Payload bytes already rendered as barcode text, plus the tags the
/// header will carry.
#[derive(Debug, Clone)]
pub struct DenseEncoded {
    pub text: String,
    pub encoding: Encoding,
    pub content_type: ContentType,
}

/// Render payload bytes as barcode text under the requested encoding.
///
/// `CompressedBase32` is a request, not a promise: below the
/// always-compress threshold the compressed form is kept only if strictly
/// smaller, and the returned encoding tag records what actually happened.
pub fn encode(
    payload: &[u8],
    content_type: ContentType,
    requested: Encoding,
) -> Result<DenseEncoded, CompressionError> {
    match requested {
        Encoding::Hex => Ok(DenseEncoded {
            text: hex::encode(payload).to_ascii_uppercase(),
            encoding: Encoding::Hex,
            content_type,
        }),
        Encoding::Base32 => Ok(DenseEncoded {
            text: base32::encode(payload),
            encoding: Encoding::Base32,
            content_type,
        }),
        Encoding::CompressedBase32 => {
            let (bytes, encoding) = if payload.len() > ALWAYS_COMPRESS_THRESHOLD {
                (compress::compress(payload)?, Encoding::CompressedBase32)
            } else {
                let compressed = compress::compress(payload)?;
                if compressed.len() >= payload.len() {
                    (payload.to_vec(), Encoding::Base32)
                } else {
                    (compressed, Encoding::CompressedBase32)
                }
            };
            Ok(DenseEncoded {
                text: base32::encode(&bytes),
                encoding,
                content_type,
            })
        }
    }
}

// ── Part sizing ───────────────────────────────────────────────────────────────

/// The fragmentation a capacity ceiling allows for a given encoded length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartPlan {
    pub num_parts: u16,
    pub part_size: usize,
}

fn round_up8(n: usize) -> usize {
    n.div_ceil(8) * 8
}

/// Two-pass part sizing. Parts stay maximally full under the capacity
/// ceiling and 8-aligned for the base32 boundary; the final part carries
/// whatever remains.
pub fn plan_parts(encoded_len: usize, capacity: usize) -> Result<PartPlan, CapacityError> {
    if capacity <= HEADER_LEN {
        return Err(CapacityError::NoPayloadRoom {
            capacity,
            header: HEADER_LEN,
        });
    }

    let room = capacity - HEADER_LEN;
    if encoded_len < room {
        return Ok(PartPlan {
            num_parts: 1,
            part_size: encoded_len,
        });
    }

    let max_part_size = (room / 8) * 8;
    if max_part_size == 0 {
        return Err(CapacityError::ZeroPartSize);
    }

    let mut num_parts = encoded_len.div_ceil(max_part_size);
    let mut part_size = round_up8(encoded_len / num_parts);
    if part_size > max_part_size {
        num_parts += 1;
        part_size = round_up8(encoded_len / num_parts);
    }

    if num_parts > usize::from(BASE36_MAX) {
        return Err(CapacityError::Base36Range(num_parts as u32));
    }

    Ok(PartPlan {
        num_parts: num_parts as u16,
        part_size,
    })
}

// ── Part production ───────────────────────────────────────────────────────────

/// Lazy, restartable, cyclic part producer. After the last part the cursor
/// wraps to zero so a sender can loop indefinitely.
#[derive(Debug)]
pub struct DenseParts {
    encoded: DenseEncoded,
    plan: PartPlan,
    cursor: u16,
}

impl DenseParts {
    pub fn new(encoded: DenseEncoded, capacity: usize) -> Result<Self, CapacityError> {
        let plan = plan_parts(encoded.text.len(), capacity)?;
        Ok(Self {
            encoded,
            plan,
            cursor: 0,
        })
    }

    /// Size the parts from a maximum physical barcode width instead of a
    /// byte capacity.
    pub fn from_width(encoded: DenseEncoded, max_width: u32) -> Result<Self, CapacityError> {
        let capacity = capacity::max_payload_bytes(max_width);
        Self::new(encoded, capacity)
    }

    pub fn num_parts(&self) -> u16 {
        self.plan.num_parts
    }

    pub fn part_size(&self) -> usize {
        self.plan.part_size
    }

    /// Zero-based index of the part the next `next_part` call will emit.
    pub fn cursor(&self) -> u16 {
        self.cursor
    }

    /// Emit the part at the cursor and advance, wrapping after the last.
    /// The final part carries the whole remainder of the encoded text.
    pub fn next_part(&mut self) -> String {
        let index = self.cursor;
        let start = usize::from(index) * self.plan.part_size;
        let slice = if index + 1 == self.plan.num_parts {
            self.cursor = 0;
            &self.encoded.text[start..]
        } else {
            self.cursor += 1;
            &self.encoded.text[start..start + self.plan.part_size]
        };

        let mut part = String::with_capacity(HEADER_LEN + slice.len());
        part.push_str(MARKER);
        part.push(self.encoded.encoding.tag());
        part.push(self.encoded.content_type.tag());
        part.push_str(&base36_pair(self.plan.num_parts));
        part.push_str(&base36_pair(index));
        part.push_str(slice);
        part
    }

    /// One full cycle of parts, in index order. Leaves the cursor at zero.
    pub fn cycle(&mut self) -> Vec<String> {
        self.cursor = 0;
        (0..self.plan.num_parts).map(|_| self.next_part()).collect()
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// A parsed part: header fields plus the borrowed payload slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensePart<'a> {
    pub encoding: Encoding,
    pub content_type: ContentType,
    pub index: u16,
    pub total: u16,
    pub payload: &'a str,
}

/// Whether text looks like a part of this scheme.
pub fn is_dense(text: &str) -> bool {
    text.as_bytes().starts_with(MARKER.as_bytes())
}

/// Parse and validate one part.
pub fn parse_part(text: &str) -> Result<DensePart<'_>, FormatError> {
    let header = text.get(..HEADER_LEN).ok_or(FormatError::HeaderTooShort)?;
    if !header.is_ascii() {
        return Err(FormatError::BadMarker(header.to_string()));
    }
    if &header[..2] != MARKER {
        return Err(FormatError::BadMarker(header[..2].to_string()));
    }

    let bytes = header.as_bytes();
    let encoding = Encoding::from_tag(bytes[2] as char)?;
    let content_type = ContentType::from_tag(bytes[3] as char)?;
    let total = base36_parse(&header[4..6])?;
    let index = base36_parse(&header[6..8])?;
    if index >= total {
        return Err(FormatError::IndexOutOfRange {
            index: usize::from(index),
            total: usize::from(total),
        });
    }

    Ok(DensePart {
        encoding,
        content_type,
        index,
        total,
        payload: &text[HEADER_LEN..],
    })
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Reverse the encoding pipeline over the collected slices, in index order.
pub fn decode(
    slices: &[String],
    encoding: Encoding,
    content_type: ContentType,
) -> Result<PayloadContent, CodecError> {
    let bytes = match encoding {
        Encoding::Hex => {
            hex::decode(slices.concat()).map_err(|e| CodecError::InvalidHex(e.to_string()))?
        }
        Encoding::Base32 | Encoding::CompressedBase32 => {
            // Non-final slices are 8-aligned by the sizing invariant, so
            // each decodes to whole bytes on its own.
            let mut data = Vec::new();
            for slice in slices {
                data.extend(base32::decode(slice)?);
            }
            if encoding == Encoding::CompressedBase32 {
                compress::decompress(&data).map_err(|e| CodecError::Decompress(e.to_string()))?
            } else {
                data
            }
        }
    };

    if content_type.is_text() {
        let text = String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
        Ok(PayloadContent::Text(text))
    } else {
        Ok(PayloadContent::Binary(Bytes::from(bytes)))
    }
}
