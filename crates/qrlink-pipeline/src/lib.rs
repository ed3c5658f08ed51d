//! Async workers bridging barcode hardware to the codecs.
//!
//! The hardware itself sits behind two small traits: a [`BarcodeSource`]
//! that yields decoded barcode text when polled, and a [`BarcodeSink`]
//! that displays one part at a time. Workers own their half of the
//! pipeline, report through an event channel, and stop cooperatively on a
//! broadcast shutdown signal.

pub mod receive;
pub mod send;

use qrlink_codecs::CompletedPayload;

pub use receive::ReceiveWorker;
pub use send::SendWorker;

/// Produces scanned barcode text. `poll` returns `None` when no barcode
/// was visible this frame.
pub trait BarcodeSource: Send + Sync {
    fn open(&mut self) -> anyhow::Result<()>;
    fn poll(&mut self) -> anyhow::Result<Option<String>>;
    fn close(&mut self);
}

/// Displays one part at a time.
pub trait BarcodeSink: Send + Sync {
    fn show(&mut self, part: &str) -> anyhow::Result<()>;
    fn clear(&mut self);
}

/// Worker progress and lifecycle reports.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    ReadProgress {
        filled: usize,
        total: usize,
        percent: f32,
    },
    ReadComplete(CompletedPayload),
    /// One part was rejected; the session is still collecting.
    ReadRejected { reason: String },
    /// The session failed and was torn down.
    ReadFailed { reason: String },
    PartDisplayed {
        position: u64,
        total: Option<usize>,
    },
    SendStopped,
}
