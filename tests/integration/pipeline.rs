//! Send and receive workers wired back to back through an in-memory link.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use qrlink_codecs::{PayloadContent, Reassembler, SchemeKind, Sequencer};
use qrlink_core::payload::{ContentType, Encoding};
use qrlink_pipeline::{BarcodeSink, BarcodeSource, PipelineEvent, ReceiveWorker, SendWorker};

use crate::test_bytes;

/// Shared queue standing in for the optical link: the sink publishes each
/// displayed part, the source scans them one per poll.
#[derive(Clone, Default)]
struct Link {
    parts: Arc<Mutex<VecDeque<String>>>,
}

struct LinkSink {
    link: Link,
}

impl BarcodeSink for LinkSink {
    fn show(&mut self, part: &str) -> anyhow::Result<()> {
        self.link.parts.lock().unwrap().push_back(part.to_string());
        Ok(())
    }

    fn clear(&mut self) {}
}

struct LinkSource {
    link: Link,
    open: Arc<AtomicBool>,
}

impl BarcodeSource for LinkSource {
    fn open(&mut self) -> anyhow::Result<()> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn poll(&mut self) -> anyhow::Result<Option<String>> {
        Ok(self.link.parts.lock().unwrap().pop_front())
    }

    fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn payload_travels_sender_to_receiver() {
    let payload = test_bytes(800);
    let sequencer =
        Sequencer::dense(&payload, ContentType::Psbt, Encoding::Base32, 33).unwrap();

    let link = Link::default();
    let open = Arc::new(AtomicBool::new(false));
    let (event_tx, mut events) = mpsc::channel(256);
    let (shutdown_tx, _) = broadcast::channel(1);

    let send = SendWorker::new(
        sequencer,
        Box::new(LinkSink { link: link.clone() }),
        event_tx.clone(),
        shutdown_tx.subscribe(),
        Duration::from_millis(2),
    );
    let receive = ReceiveWorker::new(
        Box::new(LinkSource { link, open: open.clone() }),
        Reassembler::new(),
        event_tx,
        shutdown_tx.subscribe(),
        Duration::from_millis(1),
    );

    let send_handle = tokio::spawn(send.run());
    let receive_handle = tokio::spawn(receive.run());

    // The receive worker exits on its own once the payload completes.
    let mut completed = None;
    while completed.is_none() {
        match tokio::time::timeout(Duration::from_secs(5), events.recv()).await {
            Ok(Some(PipelineEvent::ReadComplete(done))) => completed = Some(done),
            Ok(Some(_)) => {}
            Ok(None) => panic!("event channel closed before completion"),
            Err(_) => panic!("timed out waiting for reassembly"),
        }
    }
    receive_handle.await.unwrap().unwrap();
    assert!(!open.load(Ordering::SeqCst));

    shutdown_tx.send(()).unwrap();
    send_handle.await.unwrap().unwrap();

    let done = completed.unwrap();
    assert_eq!(done.scheme, SchemeKind::Dense);
    match done.content {
        PayloadContent::Binary(bytes) => assert_eq!(bytes.as_ref(), &payload[..]),
        other => panic!("expected binary payload, got {other:?}"),
    }
}

#[tokio::test]
async fn both_workers_stop_on_shutdown() {
    let sequencer = Sequencer::pmofn(&"m".repeat(300), 100).unwrap();

    let link = Link::default();
    let open = Arc::new(AtomicBool::new(false));
    let (event_tx, mut events) = mpsc::channel(1024);
    let (shutdown_tx, _) = broadcast::channel(1);

    // Feed a reassembler that will never complete: the sink publishes into
    // the link but the source is a different, empty link.
    let send = SendWorker::new(
        sequencer,
        Box::new(LinkSink { link }),
        event_tx.clone(),
        shutdown_tx.subscribe(),
        Duration::from_millis(1),
    );
    let receive = ReceiveWorker::new(
        Box::new(LinkSource { link: Link::default(), open: open.clone() }),
        Reassembler::new(),
        event_tx,
        shutdown_tx.subscribe(),
        Duration::from_millis(1),
    );

    let send_handle = tokio::spawn(send.run());
    let receive_handle = tokio::spawn(receive.run());

    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown_tx.send(()).unwrap();

    send_handle.await.unwrap().unwrap();
    receive_handle.await.unwrap().unwrap();
    assert!(!open.load(Ordering::SeqCst));

    // The send worker reported displayed parts and its stop.
    let mut displayed = 0;
    let mut stopped = false;
    while let Ok(event) = events.try_recv() {
        match event {
            PipelineEvent::PartDisplayed { .. } => displayed += 1,
            PipelineEvent::SendStopped => stopped = true,
            _ => {}
        }
    }
    assert!(displayed > 0);
    assert!(stopped);
}
