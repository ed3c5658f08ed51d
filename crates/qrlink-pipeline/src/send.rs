//! Send worker — drives the sequencer one part per tick into the barcode
//! sink. A single-part payload is shown once and held statically; a
//! multi-part payload animates until shutdown.

use std::time::Duration;

use anyhow::{bail, Context};
use tokio::sync::{broadcast, mpsc};

use qrlink_codecs::Sequencer;

use crate::{BarcodeSink, PipelineEvent};

pub struct SendWorker {
    sequencer: Sequencer,
    sink: Box<dyn BarcodeSink>,
    events: mpsc::Sender<PipelineEvent>,
    shutdown: broadcast::Receiver<()>,
    part_delay: Duration,
}

impl SendWorker {
    pub fn new(
        sequencer: Sequencer,
        sink: Box<dyn BarcodeSink>,
        events: mpsc::Sender<PipelineEvent>,
        shutdown: broadcast::Receiver<()>,
        part_delay: Duration,
    ) -> Self {
        Self {
            sequencer,
            sink,
            events,
            shutdown,
            part_delay,
        }
    }

    /// Run until shutdown. The sink is cleared on every exit path.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let result = self.display_loop().await;
        self.sink.clear();
        let _ = self.events.send(PipelineEvent::SendStopped).await;
        result
    }

    async fn display_loop(&mut self) -> anyhow::Result<()> {
        if !self.sequencer.is_multi() {
            // Nothing to animate, show the one part and hold it.
            let part = self
                .sequencer
                .next_part()
                .context("failed to produce part")?;
            self.sink.show(&part.text).context("failed to display part")?;
            self.emit(PipelineEvent::PartDisplayed {
                position: part.position,
                total: part.total,
            })
            .await?;

            let _ = self.shutdown.recv().await;
            tracing::info!("send worker shutting down");
            return Ok(());
        }

        loop {
            let part = self
                .sequencer
                .next_part()
                .context("failed to produce part")?;
            self.sink.show(&part.text).context("failed to display part")?;
            self.emit(PipelineEvent::PartDisplayed {
                position: part.position,
                total: part.total,
            })
            .await?;

            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("send worker shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.part_delay) => {}
            }
        }
    }

    async fn emit(&self, event: PipelineEvent) -> anyhow::Result<()> {
        if self.events.send(event).await.is_err() {
            bail!("event receiver dropped, terminating send worker");
        }
        Ok(())
    }
}
