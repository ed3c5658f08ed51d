//! Sender-side part sequencing.
//!
//! A [`Sequencer`] turns one outgoing payload into an endless stream of
//! displayable parts, cycling for the bounded schemes and generating fresh
//! parts forever for fountain coding. Display workers drive it one part per
//! tick without caring which scheme is underneath.

use qrlink_core::error::CapacityError;
use qrlink_core::payload::{ContentType, Encoding};

use crate::compress::CompressionError;
use crate::dense::{self, DenseParts};
use crate::fountain::{Envelope, FountainCodec, FountainEncoder, FountainError};
use crate::pmofn;

/// One part ready to display, with its position for progress reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedPart {
    pub text: String,
    /// 1-based for the bounded schemes; the encoder's own sequence number
    /// for fountain streams, which never wraps.
    pub position: u64,
    /// `None` when the stream is unbounded with no length estimate yet.
    pub total: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error(transparent)]
    Capacity(#[from] CapacityError),

    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error(transparent)]
    Fountain(#[from] FountainError),
}

enum Inner {
    Single {
        text: String,
    },
    Dense {
        parts: DenseParts,
    },
    Pmofn {
        parts: Vec<String>,
        cursor: usize,
    },
    Fountain {
        encoder: Box<dyn FountainEncoder>,
    },
}

pub struct Sequencer {
    inner: Inner,
}

impl Sequencer {
    /// A payload small enough for one barcode; the same part repeats.
    pub fn single(text: impl Into<String>) -> Self {
        Self {
            inner: Inner::Single { text: text.into() },
        }
    }

    /// Densely-packed framing sized from the physical barcode width.
    pub fn dense(
        payload: &[u8],
        content_type: ContentType,
        requested: Encoding,
        max_width: u32,
    ) -> Result<Self, SequencerError> {
        let encoded = dense::encode(payload, content_type, requested)?;
        let parts = DenseParts::from_width(encoded, max_width)?;
        Ok(Self {
            inner: Inner::Dense { parts },
        })
    }

    /// `pMofN` framing. Text that fits one chunk is sent unframed.
    pub fn pmofn(text: &str, chunk_size: usize) -> Result<Self, SequencerError> {
        if chunk_size == 0 {
            return Err(CapacityError::ZeroPartSize.into());
        }
        if text.chars().count() <= chunk_size {
            return Ok(Self::single(text));
        }
        let parts = pmofn::split(text, chunk_size)?;
        Ok(Self {
            inner: Inner::Pmofn { parts, cursor: 0 },
        })
    }

    /// Rateless fountain stream.
    pub fn fountain(
        codec: &dyn FountainCodec,
        envelope: Envelope,
        max_part_size: usize,
    ) -> Result<Self, SequencerError> {
        if max_part_size == 0 {
            return Err(CapacityError::ZeroPartSize.into());
        }
        let encoder = codec.encoder(envelope, max_part_size)?;
        Ok(Self {
            inner: Inner::Fountain { encoder },
        })
    }

    /// Emit the next part. Bounded schemes cycle; fountain streams never
    /// repeat. Fountain parts are uppercased so the densest barcode
    /// character mode applies.
    pub fn next_part(&mut self) -> Result<SequencedPart, SequencerError> {
        match &mut self.inner {
            Inner::Single { text } => Ok(SequencedPart {
                text: text.clone(),
                position: 1,
                total: Some(1),
            }),
            Inner::Dense { parts } => {
                let index = parts.cursor();
                let text = parts.next_part();
                Ok(SequencedPart {
                    text,
                    position: u64::from(index) + 1,
                    total: Some(usize::from(parts.num_parts())),
                })
            }
            Inner::Pmofn { parts, cursor } => {
                let text = parts[*cursor].clone();
                let position = (*cursor + 1) as u64;
                *cursor = (*cursor + 1) % parts.len();
                Ok(SequencedPart {
                    text,
                    position,
                    total: Some(parts.len()),
                })
            }
            Inner::Fountain { encoder } => {
                let text = encoder.next_part()?.to_uppercase();
                Ok(SequencedPart {
                    text,
                    position: encoder.sequence_number(),
                    total: encoder.expected_parts(),
                })
            }
        }
    }

    /// Declared part count, when the scheme has one.
    pub fn total_parts(&self) -> Option<usize> {
        match &self.inner {
            Inner::Single { .. } => Some(1),
            Inner::Dense { parts } => Some(usize::from(parts.num_parts())),
            Inner::Pmofn { parts, .. } => Some(parts.len()),
            Inner::Fountain { encoder } => encoder.expected_parts(),
        }
    }

    /// Whether the display loop needs to animate at all.
    pub fn is_multi(&self) -> bool {
        !matches!(
            (&self.inner, self.total_parts()),
            (Inner::Single { .. }, _) | (_, Some(1))
        )
    }
}
