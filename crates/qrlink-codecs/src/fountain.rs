//! Fountain-coded framing adapter.
//!
//! The fountain arithmetic itself lives behind the [`FountainCodec`] trait;
//! this module owns the envelope model, part detection, and the dispatch
//! that turns a decoded envelope into displayable text. Wallet-specific
//! rendering (descriptors, PSBT serialization) is likewise behind
//! [`WalletCodec`] so the reassembly layer stays wallet-agnostic.

use qrlink_core::error::UnsupportedType;

/// Registry prefix opening every part, matched case-insensitively.
pub const PREFIX: &str = "ur:";

/// Semantic type of a decoded envelope, keyed by its registry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeKind {
    Account,
    Psbt,
    OutputDescriptor,
    Bytes,
    Other(String),
}

impl EnvelopeKind {
    pub fn registry_name(&self) -> &str {
        match self {
            EnvelopeKind::Account => "crypto-account",
            EnvelopeKind::Psbt => "crypto-psbt",
            EnvelopeKind::OutputDescriptor => "crypto-output",
            EnvelopeKind::Bytes => "bytes",
            EnvelopeKind::Other(name) => name,
        }
    }

    pub fn from_registry_name(name: &str) -> Self {
        match name {
            "crypto-account" => EnvelopeKind::Account,
            "crypto-psbt" => EnvelopeKind::Psbt,
            "crypto-output" => EnvelopeKind::OutputDescriptor,
            "bytes" => EnvelopeKind::Bytes,
            other => EnvelopeKind::Other(other.to_string()),
        }
    }
}

/// A fully decoded message: its registry type plus the raw payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub kind: EnvelopeKind,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FountainError {
    #[error("malformed fountain part: {0}")]
    Part(String),

    #[error("fountain decode failed: {0}")]
    Decode(String),

    #[error("fountain encode failed: {0}")]
    Encode(String),

    #[error("no fountain codec configured")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("wallet rendering failed: {0}")]
pub struct WalletError(pub String);

/// Incremental fountain decoder for one session.
///
/// Completion and success are distinct: a decoder can finish in a failed
/// state, in which case [`result_error`](FountainDecoder::result_error)
/// carries the diagnostic.
pub trait FountainDecoder: Send + Sync {
    fn receive_part(&mut self, part: &str) -> Result<(), FountainError>;
    fn is_complete(&self) -> bool;
    fn is_success(&self) -> bool;
    fn result_message(&mut self) -> Result<Envelope, FountainError>;
    fn result_error(&self) -> String;
    /// Estimated completion in `[0.0, 1.0]`.
    fn estimated_percent(&self) -> f32;
    fn processed_parts(&self) -> usize;
    /// `None` until enough parts arrived to know the message length.
    fn expected_parts(&self) -> Option<usize>;
}

/// Rateless part generator for one message.
///
/// Sequence numbers come from the encoder itself: the stream is unbounded
/// and the adapter never second-guesses the arithmetic underneath.
pub trait FountainEncoder: Send + Sync {
    fn next_part(&mut self) -> Result<String, FountainError>;
    fn sequence_number(&self) -> u64;
    fn expected_parts(&self) -> Option<usize>;
}

/// Factory seam for the fountain implementation.
pub trait FountainCodec: Send + Sync {
    fn decoder(&self) -> Box<dyn FountainDecoder>;
    fn encoder(
        &self,
        envelope: Envelope,
        max_part_size: usize,
    ) -> Result<Box<dyn FountainEncoder>, FountainError>;
}

/// Wallet-side rendering of decoded envelope payloads.
pub trait WalletCodec: Send + Sync {
    fn account_descriptor(&self, payload: &[u8]) -> Result<String, WalletError>;
    fn psbt_string(&self, payload: &[u8]) -> Result<String, WalletError>;
    fn output_descriptor(&self, payload: &[u8]) -> Result<String, WalletError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnwrapError {
    #[error(transparent)]
    Unsupported(#[from] UnsupportedType),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("bytes envelope is not valid UTF-8")]
    InvalidUtf8,

    #[error("no wallet codec configured for {0:?} envelopes")]
    NoWalletCodec(String),
}

/// Whether text looks like a part of this scheme.
pub fn is_fountain(text: &str) -> bool {
    text.get(..PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(PREFIX))
}

/// Render a decoded envelope as displayable text.
///
/// The dispatch table is fixed: account and output envelopes become
/// descriptors, PSBTs go through the wallet serializer, `bytes` is taken
/// as UTF-8. Anything else is surfaced as unsupported rather than guessed
/// at.
pub fn unwrap_message(
    envelope: &Envelope,
    wallet: Option<&dyn WalletCodec>,
) -> Result<String, UnwrapError> {
    let needs_wallet = || {
        UnwrapError::NoWalletCodec(envelope.kind.registry_name().to_string())
    };
    match &envelope.kind {
        EnvelopeKind::Account => {
            let wallet = wallet.ok_or_else(needs_wallet)?;
            Ok(wallet.account_descriptor(&envelope.payload)?)
        }
        EnvelopeKind::Psbt => {
            let wallet = wallet.ok_or_else(needs_wallet)?;
            Ok(wallet.psbt_string(&envelope.payload)?)
        }
        EnvelopeKind::OutputDescriptor => {
            let wallet = wallet.ok_or_else(needs_wallet)?;
            Ok(wallet.output_descriptor(&envelope.payload)?)
        }
        EnvelopeKind::Bytes => String::from_utf8(envelope.payload.clone())
            .map_err(|_| UnwrapError::InvalidUtf8),
        EnvelopeKind::Other(name) => Err(UnsupportedType(name.clone()).into()),
    }
}
