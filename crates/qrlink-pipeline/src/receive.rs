//! Receive worker — polls the barcode source on a fixed cadence, feeds
//! scanned text into the reassembler, and reports progress until a payload
//! completes.

use std::time::Duration;

use anyhow::{bail, Context};
use tokio::sync::{broadcast, mpsc};

use qrlink_codecs::{Reassembler, ReceiveOutcome};

use crate::{BarcodeSource, PipelineEvent};

pub struct ReceiveWorker {
    source: Box<dyn BarcodeSource>,
    reassembler: Reassembler,
    events: mpsc::Sender<PipelineEvent>,
    shutdown: broadcast::Receiver<()>,
    poll_interval: Duration,
}

impl ReceiveWorker {
    pub fn new(
        source: Box<dyn BarcodeSource>,
        reassembler: Reassembler,
        events: mpsc::Sender<PipelineEvent>,
        shutdown: broadcast::Receiver<()>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            reassembler,
            events,
            shutdown,
            poll_interval,
        }
    }

    /// Run until a payload completes, shutdown is signalled, or the source
    /// fails. The source is released on every exit path.
    pub async fn run(mut self) -> anyhow::Result<()> {
        self.source.open().context("failed to open barcode source")?;
        let result = self.scan_loop().await;
        self.source.close();
        result
    }

    async fn scan_loop(&mut self) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("receive worker shutting down");
                    return Ok(());
                }

                _ = ticker.tick() => {
                    let text = match self.source.poll() {
                        Ok(Some(text)) => text,
                        Ok(None) => continue,
                        Err(e) => {
                            tracing::warn!(error = %e, "barcode source poll failed");
                            continue;
                        }
                    };

                    match self.reassembler.receive(&text) {
                        Ok(ReceiveOutcome::Collecting(progress)) => {
                            self.emit(PipelineEvent::ReadProgress {
                                filled: progress.filled,
                                total: progress.total,
                                percent: progress.percent,
                            })
                            .await?;
                        }
                        Ok(ReceiveOutcome::Complete(payload)) => {
                            tracing::info!(
                                scheme = ?payload.scheme,
                                payload_len = payload.content.len(),
                                "payload reassembled"
                            );
                            self.emit(PipelineEvent::ReadComplete(payload)).await?;
                            return Ok(());
                        }
                        Err(e) if e.is_session_fatal() => {
                            tracing::warn!(error = %e, "session failed, restarting collection");
                            self.emit(PipelineEvent::ReadFailed { reason: e.to_string() })
                                .await?;
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "part rejected");
                            self.emit(PipelineEvent::ReadRejected { reason: e.to_string() })
                                .await?;
                        }
                    }
                }
            }
        }
    }

    async fn emit(&self, event: PipelineEvent) -> anyhow::Result<()> {
        if self.events.send(event).await.is_err() {
            bail!("event receiver dropped, terminating receive worker");
        }
        Ok(())
    }
}
