//! Framing schemes, the compression collaborator, the unified reassembly
//! state machine, and the sender-side sequencer.

pub mod compress;
pub mod dense;
pub mod fountain;
pub mod pmofn;
pub mod sequencer;
pub mod session;

use bytes::Bytes;

pub use sequencer::{SequencedPart, Sequencer, SequencerError};
pub use session::{
    detect, CompletedPayload, Progress, Reassembler, ReceiveError, ReceiveOutcome, SchemeKind,
};

/// Reconstructed payload content, as handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadContent {
    /// The declared content type was textual, or the payload was a
    /// single-part scan.
    Text(String),
    /// Raw bytes: transactions, key material.
    Binary(Bytes),
}

impl PayloadContent {
    /// Length in bytes of the reconstructed payload.
    pub fn len(&self) -> usize {
        match self {
            PayloadContent::Text(t) => t.len(),
            PayloadContent::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text form for display: text as-is, binary as lowercase hex.
    pub fn display_text(&self) -> String {
        match self {
            PayloadContent::Text(t) => t.clone(),
            PayloadContent::Binary(b) => hex::encode(b),
        }
    }
}
