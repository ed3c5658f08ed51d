//! End-to-end encode/reassemble coverage across the framing schemes.

use std::sync::Arc;

use qrlink_codecs::fountain::{Envelope, EnvelopeKind};
use qrlink_codecs::{
    PayloadContent, Reassembler, ReceiveError, ReceiveOutcome, SchemeKind, Sequencer,
};
use qrlink_core::payload::{ContentType, Encoding};

use crate::{test_bytes, ChunkCodec, TestWallet};

fn collect_cycle(seq: &mut Sequencer) -> Vec<String> {
    let total = seq.total_parts().unwrap();
    (0..total)
        .map(|_| seq.next_part().unwrap().text)
        .collect()
}

fn feed_to_completion(rx: &mut Reassembler, parts: &[String]) -> qrlink_codecs::CompletedPayload {
    for part in parts {
        if let ReceiveOutcome::Complete(done) = rx.receive(part).unwrap() {
            return done;
        }
    }
    panic!("parts exhausted before completion");
}

#[test]
fn large_sparse_payload_compresses_and_round_trips() {
    let payload = vec![0u8; 12000];
    let mut seq = Sequencer::dense(
        &payload,
        ContentType::Psbt,
        Encoding::CompressedBase32,
        51,
    )
    .unwrap();
    let parts = collect_cycle(&mut seq);

    // Above the always-compress threshold the compressed form is kept, and
    // 12000 identical bytes deflate far below one barcode's budget.
    let first = qrlink_codecs::dense::parse_part(&parts[0]).unwrap();
    assert_eq!(first.encoding, Encoding::CompressedBase32);
    assert_eq!(usize::from(first.total), parts.len());

    let done = feed_to_completion(&mut Reassembler::new(), &parts);
    assert_eq!(done.scheme, SchemeKind::Dense);
    assert_eq!(done.content_type, Some(ContentType::Psbt));
    match done.content {
        PayloadContent::Binary(bytes) => assert_eq!(bytes.as_ref(), &payload[..]),
        other => panic!("expected binary payload, got {other:?}"),
    }
}

#[test]
fn repetitive_payload_spans_multiple_parts() {
    // A repeated block compresses well but not below one part's budget.
    let block = test_bytes(256);
    let payload: Vec<u8> = std::iter::repeat(block).take(40).flatten().collect();

    let mut seq = Sequencer::dense(
        &payload,
        ContentType::Transaction,
        Encoding::CompressedBase32,
        51,
    )
    .unwrap();
    let parts = collect_cycle(&mut seq);
    assert!(parts.len() > 1);

    let done = feed_to_completion(&mut Reassembler::new(), &parts);
    match done.content {
        PayloadContent::Binary(bytes) => assert_eq!(bytes.as_ref(), &payload[..]),
        other => panic!("expected binary payload, got {other:?}"),
    }
}

#[test]
fn tiny_hex_payload_is_a_single_known_part() {
    let mut seq = Sequencer::dense(b"abc", ContentType::Unicode, Encoding::Hex, 51).unwrap();
    let parts = collect_cycle(&mut seq);
    assert_eq!(parts, vec!["B$HU0100616263".to_string()]);

    let done = feed_to_completion(&mut Reassembler::new(), &parts);
    assert_eq!(done.content, PayloadContent::Text("abc".into()));
}

#[test]
fn pmofn_text_round_trips_in_reverse_order() {
    let text: String = (0..250).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let mut seq = Sequencer::pmofn(&text, 100).unwrap();
    let mut parts = collect_cycle(&mut seq);
    assert_eq!(parts.len(), 3);
    assert!(parts[0].starts_with("p1of3 "));

    parts.reverse();
    let done = feed_to_completion(&mut Reassembler::new(), &parts);
    assert_eq!(done.scheme, SchemeKind::Pmofn);
    assert_eq!(done.content, PayloadContent::Text(text));
}

#[test]
fn duplicates_are_tolerated_conflicts_are_not() {
    let payload = test_bytes(600);
    let mut seq = Sequencer::dense(&payload, ContentType::Psbt, Encoding::Base32, 29).unwrap();
    let parts = collect_cycle(&mut seq);
    assert!(parts.len() > 2);

    let mut rx = Reassembler::new();
    rx.receive(&parts[0]).unwrap();
    rx.receive(&parts[0]).unwrap();
    rx.receive(&parts[1]).unwrap();
    assert!(rx.is_collecting());

    let mut forged = parts[1].clone();
    forged.push_str("22222222");
    let err = rx.receive(&forged).unwrap_err();
    assert!(matches!(err, ReceiveError::Integrity(_)));
    assert!(err.is_session_fatal());
    assert!(!rx.is_collecting());

    // The payload is still recoverable with a fresh pass.
    let done = feed_to_completion(&mut rx, &parts);
    match done.content {
        PayloadContent::Binary(bytes) => assert_eq!(bytes.as_ref(), &payload[..]),
        other => panic!("expected binary payload, got {other:?}"),
    }
}

#[test]
fn fountain_stream_decodes_through_the_wallet() {
    let payload = test_bytes(120);
    let envelope = Envelope {
        kind: EnvelopeKind::Psbt,
        payload: payload.clone(),
    };
    let mut seq = Sequencer::fountain(&ChunkCodec, envelope, 64).unwrap();
    let mut rx = Reassembler::with_fountain(Arc::new(ChunkCodec), Some(Arc::new(TestWallet)));

    let mut done = None;
    for _ in 0..32 {
        let part = seq.next_part().unwrap();
        assert!(part.text.starts_with("UR:"));
        if let ReceiveOutcome::Complete(payload) = rx.receive(&part.text).unwrap() {
            done = Some(payload);
            break;
        }
    }

    let done = done.expect("fountain stream never completed");
    assert_eq!(done.scheme, SchemeKind::Fountain);
    assert_eq!(
        done.content,
        PayloadContent::Text(format!("psbt:{}", hex::encode(&payload)))
    );
}

#[test]
fn fountain_bytes_envelope_needs_no_wallet() {
    let envelope = Envelope {
        kind: EnvelopeKind::Bytes,
        payload: b"standalone note".to_vec(),
    };
    let mut seq = Sequencer::fountain(&ChunkCodec, envelope, 16).unwrap();
    let mut rx = Reassembler::with_fountain(Arc::new(ChunkCodec), None);

    let mut done = None;
    for _ in 0..32 {
        let part = seq.next_part().unwrap();
        if let ReceiveOutcome::Complete(payload) = rx.receive(&part.text).unwrap() {
            done = Some(payload);
            break;
        }
    }
    assert_eq!(
        done.unwrap().content,
        PayloadContent::Text("standalone note".into())
    );
}

#[test]
fn fountain_unknown_kind_is_surfaced() {
    let envelope = Envelope {
        kind: EnvelopeKind::Other("crypto-seed".into()),
        payload: vec![1, 2, 3],
    };
    let mut seq = Sequencer::fountain(&ChunkCodec, envelope, 64).unwrap();
    let mut rx = Reassembler::with_fountain(Arc::new(ChunkCodec), Some(Arc::new(TestWallet)));

    let part = seq.next_part().unwrap();
    let err = rx.receive(&part.text).unwrap_err();
    assert!(matches!(err, ReceiveError::Unwrap(_)));
    assert!(err.is_session_fatal());
    assert!(!rx.is_collecting());
}

#[test]
fn mixed_scheme_scan_interrupts_as_single_part() {
    let dense = {
        let mut seq =
            Sequencer::dense(&test_bytes(600), ContentType::Psbt, Encoding::Base32, 29).unwrap();
        collect_cycle(&mut seq)
    };
    let pmofn = {
        let mut seq = Sequencer::pmofn(&"q".repeat(30), 10).unwrap();
        collect_cycle(&mut seq)
    };

    let mut rx = Reassembler::new();
    rx.receive(&dense[0]).unwrap();
    assert!(rx.is_collecting());

    // A scan outside the locked scheme ends the session and is delivered
    // verbatim as a single-part payload.
    match rx.receive(&pmofn[0]).unwrap() {
        ReceiveOutcome::Complete(done) => {
            assert_eq!(done.scheme, SchemeKind::Single);
            assert_eq!(done.content, PayloadContent::Text(pmofn[0].clone()));
        }
        other => panic!("expected completion, got {other:?}"),
    }
    assert!(!rx.is_collecting());

    // The interrupted payload is still recoverable from a fresh pass.
    let done = feed_to_completion(&mut rx, &dense);
    assert_eq!(done.scheme, SchemeKind::Dense);
}
