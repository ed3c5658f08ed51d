//! Unified reassembly across all framing schemes.
//!
//! A [`Reassembler`] accepts scanned barcode text one part at a time,
//! detects the scheme on the first part, locks the session to it, and
//! reports either collection progress or the completed payload. Error
//! severity follows the taxonomy in `qrlink_core::error`: a malformed part
//! is rejected without touching the session, while integrity and decode
//! failures tear the session down.

use std::sync::Arc;

use qrlink_core::error::{CodecError, FormatError, IntegrityError};
use qrlink_core::payload::{ContentType, Encoding};

use crate::dense;
use crate::fountain::{
    self, unwrap_message, FountainCodec, FountainDecoder, FountainError, UnwrapError, WalletCodec,
};
use crate::pmofn;
use crate::PayloadContent;

/// Framing scheme of a part or a locked session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    Dense,
    Pmofn,
    Fountain,
    /// Unframed text: a complete payload in a single barcode.
    Single,
}

fn matches_scheme(text: &str, scheme: SchemeKind) -> bool {
    match scheme {
        SchemeKind::Dense => dense::is_dense(text),
        SchemeKind::Pmofn => pmofn::is_pmofn(text),
        SchemeKind::Fountain => fountain::is_fountain(text),
        SchemeKind::Single => true,
    }
}

/// Classify a scanned text. Dense framing wins ties because its marker is
/// the most specific; anything matching no scheme is a single-part payload.
pub fn detect(text: &str) -> SchemeKind {
    if dense::is_dense(text) {
        SchemeKind::Dense
    } else if pmofn::is_pmofn(text) {
        SchemeKind::Pmofn
    } else if fountain::is_fountain(text) {
        SchemeKind::Fountain
    } else {
        SchemeKind::Single
    }
}

/// Collection progress for an in-flight session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub filled: usize,
    /// Declared total, or zero while a fountain session has not yet learned
    /// the message length.
    pub total: usize,
    pub percent: f32,
}

impl Progress {
    fn counted(filled: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            filled as f32 / total as f32
        };
        Self { filled, total, percent }
    }
}

/// A fully reassembled payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedPayload {
    pub scheme: SchemeKind,
    /// Only densely-framed payloads carry a content-type tag on the wire.
    pub content_type: Option<ContentType>,
    pub content: PayloadContent,
}

/// Result of feeding one part into the reassembler.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiveOutcome {
    Collecting(Progress),
    Complete(CompletedPayload),
}

#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Fountain(#[from] FountainError),

    #[error(transparent)]
    Unwrap(#[from] UnwrapError),
}

impl ReceiveError {
    /// Whether this error ended the session. Format errors reject only the
    /// offending part; the caller may keep scanning.
    pub fn is_session_fatal(&self) -> bool {
        match self {
            ReceiveError::Format(_) => false,
            ReceiveError::Fountain(err) => matches!(err, FountainError::Decode(_)),
            ReceiveError::Integrity(_) | ReceiveError::Codec(_) | ReceiveError::Unwrap(_) => true,
        }
    }
}

/// Index-addressed part buffer. Duplicates with identical content are
/// tolerated; a conflicting duplicate is an integrity failure.
#[derive(Debug)]
struct SlotBuffer {
    slots: Vec<Option<String>>,
    filled: usize,
}

impl SlotBuffer {
    fn new(total: usize) -> Self {
        Self {
            slots: vec![None; total],
            filled: 0,
        }
    }

    fn total(&self) -> usize {
        self.slots.len()
    }

    fn insert(&mut self, index: usize, content: &str) -> Result<(), IntegrityError> {
        match &self.slots[index] {
            Some(held) if held != content => Err(IntegrityError { index }),
            Some(_) => Ok(()),
            None => {
                self.slots[index] = Some(content.to_string());
                self.filled += 1;
                Ok(())
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    fn into_slices(self) -> Vec<String> {
        self.slots.into_iter().flatten().collect()
    }
}

enum Session {
    Dense {
        encoding: Encoding,
        content_type: ContentType,
        buffer: SlotBuffer,
    },
    Pmofn {
        buffer: SlotBuffer,
    },
    Fountain {
        decoder: Box<dyn FountainDecoder>,
    },
}

impl Session {
    fn scheme(&self) -> SchemeKind {
        match self {
            Session::Dense { .. } => SchemeKind::Dense,
            Session::Pmofn { .. } => SchemeKind::Pmofn,
            Session::Fountain { .. } => SchemeKind::Fountain,
        }
    }
}

/// Scheme-agnostic receive state machine.
pub struct Reassembler {
    fountain: Option<Arc<dyn FountainCodec>>,
    wallet: Option<Arc<dyn WalletCodec>>,
    session: Option<Session>,
}

impl Reassembler {
    /// A reassembler without fountain support; fountain parts are refused
    /// with [`FountainError::Unavailable`].
    pub fn new() -> Self {
        Self {
            fountain: None,
            wallet: None,
            session: None,
        }
    }

    pub fn with_fountain(
        codec: Arc<dyn FountainCodec>,
        wallet: Option<Arc<dyn WalletCodec>>,
    ) -> Self {
        Self {
            fountain: Some(codec),
            wallet,
            session: None,
        }
    }

    /// Drop any in-flight session.
    pub fn reset(&mut self) {
        self.session = None;
    }

    pub fn is_collecting(&self) -> bool {
        self.session.is_some()
    }

    /// Feed one scanned barcode text.
    ///
    /// The first recognized part locks the session to its scheme. A later
    /// part that does not match the locked scheme's pattern replaces the
    /// session with a complete single-part payload, so the operator always
    /// sees what was scanned.
    pub fn receive(&mut self, text: &str) -> Result<ReceiveOutcome, ReceiveError> {
        let scheme = match &self.session {
            Some(session) => {
                let locked = session.scheme();
                if !matches_scheme(text, locked) {
                    tracing::debug!(
                        held = ?locked,
                        "part does not match locked scheme, completing as single-part"
                    );
                    self.session = None;
                    return Ok(Self::single_part(text));
                }
                locked
            }
            None => detect(text),
        };

        match scheme {
            SchemeKind::Dense => self.receive_dense(text),
            SchemeKind::Pmofn => self.receive_pmofn(text),
            SchemeKind::Fountain => self.receive_fountain(text),
            SchemeKind::Single => Ok(Self::single_part(text)),
        }
    }

    fn single_part(text: &str) -> ReceiveOutcome {
        ReceiveOutcome::Complete(CompletedPayload {
            scheme: SchemeKind::Single,
            content_type: None,
            content: PayloadContent::Text(text.to_string()),
        })
    }

    fn receive_dense(&mut self, text: &str) -> Result<ReceiveOutcome, ReceiveError> {
        // Parse failures leave the session untouched.
        let part = dense::parse_part(text)?;

        if self.session.is_none() {
            self.session = Some(Session::Dense {
                encoding: part.encoding,
                content_type: part.content_type,
                buffer: SlotBuffer::new(usize::from(part.total)),
            });
        }
        let Some(Session::Dense { encoding, content_type, buffer }) = &mut self.session else {
            return Err(FormatError::BadMarker(text.chars().take(8).collect()).into());
        };

        if usize::from(part.total) != buffer.total() {
            return Err(FormatError::TotalMismatch {
                expected: buffer.total(),
                found: usize::from(part.total),
            }
            .into());
        }
        if part.encoding != *encoding {
            return Err(FormatError::EncodingMismatch {
                expected: *encoding,
                found: part.encoding,
            }
            .into());
        }
        if part.content_type != *content_type {
            return Err(FormatError::ContentTypeMismatch {
                expected: *content_type,
                found: part.content_type,
            }
            .into());
        }

        if let Err(err) = buffer.insert(usize::from(part.index), part.payload) {
            self.session = None;
            return Err(err.into());
        }

        if !buffer.is_complete() {
            return Ok(ReceiveOutcome::Collecting(Progress::counted(
                buffer.filled,
                buffer.total(),
            )));
        }

        let Some(Session::Dense { encoding, content_type, buffer }) = self.session.take() else {
            return Err(FormatError::BadMarker(text.chars().take(8).collect()).into());
        };
        let decoded = dense::decode(&buffer.into_slices(), encoding, content_type);
        let content = match decoded {
            Ok(content) => content,
            Err(err) => return Err(err.into()),
        };
        Ok(ReceiveOutcome::Complete(CompletedPayload {
            scheme: SchemeKind::Dense,
            content_type: Some(content_type),
            content,
        }))
    }

    fn receive_pmofn(&mut self, text: &str) -> Result<ReceiveOutcome, ReceiveError> {
        let part = pmofn::parse_part(text)?;

        if self.session.is_none() {
            self.session = Some(Session::Pmofn {
                buffer: SlotBuffer::new(part.total),
            });
        }
        let Some(Session::Pmofn { buffer }) = &mut self.session else {
            return Err(FormatError::BadMarker(text.chars().take(8).collect()).into());
        };

        if part.total != buffer.total() {
            return Err(FormatError::TotalMismatch {
                expected: buffer.total(),
                found: part.total,
            }
            .into());
        }

        if let Err(err) = buffer.insert(part.index, part.content) {
            self.session = None;
            return Err(err.into());
        }

        if !buffer.is_complete() {
            return Ok(ReceiveOutcome::Collecting(Progress::counted(
                buffer.filled,
                buffer.total(),
            )));
        }

        let Some(Session::Pmofn { buffer }) = self.session.take() else {
            return Err(FormatError::BadMarker(text.chars().take(8).collect()).into());
        };
        let content = buffer.into_slices().concat();
        Ok(ReceiveOutcome::Complete(CompletedPayload {
            scheme: SchemeKind::Pmofn,
            content_type: None,
            content: PayloadContent::Text(content),
        }))
    }

    fn receive_fountain(&mut self, text: &str) -> Result<ReceiveOutcome, ReceiveError> {
        if self.session.is_none() {
            let codec = self.fountain.as_ref().ok_or(FountainError::Unavailable)?;
            self.session = Some(Session::Fountain {
                decoder: codec.decoder(),
            });
        }
        let Some(Session::Fountain { decoder }) = &mut self.session else {
            return Err(FountainError::Part(text.chars().take(16).collect()).into());
        };

        // A part the decoder rejects is treated like a format error: the
        // session keeps waiting for usable parts.
        decoder
            .receive_part(text)
            .map_err(|e| FountainError::Part(e.to_string()))?;

        if !decoder.is_complete() {
            return Ok(ReceiveOutcome::Collecting(Progress {
                filled: decoder.processed_parts(),
                total: decoder.expected_parts().unwrap_or(0),
                percent: decoder.estimated_percent(),
            }));
        }

        let result = if decoder.is_success() {
            decoder.result_message()
        } else {
            Err(FountainError::Decode(decoder.result_error()))
        };
        self.session = None;

        let envelope = result?;
        let text = unwrap_message(&envelope, self.wallet.as_deref())?;
        Ok(ReceiveOutcome::Complete(CompletedPayload {
            scheme: SchemeKind::Fountain,
            content_type: None,
            content: PayloadContent::Text(text),
        }))
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}
