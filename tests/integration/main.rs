//! qrlink integration test harness.
//!
//! Exercises the codecs and the async workers together: payloads go
//! through a sequencer into a sink, and the captured parts are fed back
//! through a reassembler. The fountain arithmetic is stood in for by a
//! deterministic chunk codec so the surrounding machinery is what gets
//! tested, not the rateless math.

mod pipeline;
mod roundtrip;

use qrlink_codecs::fountain::{
    Envelope, EnvelopeKind, FountainCodec, FountainDecoder, FountainEncoder, FountainError,
    WalletCodec, WalletError,
};

// ── Harness ───────────────────────────────────────────────────────────────────

/// Deterministic stand-in for a fountain codec. Parts look like
/// `ur:{kind}/{index}-{total}/{hexchunk}`; the decoder completes once all
/// indices were seen, the encoder cycles through them while the sequence
/// number keeps climbing.
pub struct ChunkCodec;

impl FountainCodec for ChunkCodec {
    fn decoder(&self) -> Box<dyn FountainDecoder> {
        Box::new(ChunkDecoder {
            chunks: Vec::new(),
            kind: None,
            processed: 0,
        })
    }

    fn encoder(
        &self,
        envelope: Envelope,
        max_part_size: usize,
    ) -> Result<Box<dyn FountainEncoder>, FountainError> {
        // Hex doubles the payload, so each chunk carries half a part's
        // worth of bytes.
        let chunk_bytes = (max_part_size / 2).max(1);
        let total = envelope.payload.len().div_ceil(chunk_bytes).max(1);
        Ok(Box::new(ChunkEncoder {
            envelope,
            chunk_bytes,
            total,
            seq: 0,
        }))
    }
}

pub struct ChunkEncoder {
    envelope: Envelope,
    chunk_bytes: usize,
    total: usize,
    seq: u64,
}

impl FountainEncoder for ChunkEncoder {
    fn next_part(&mut self) -> Result<String, FountainError> {
        self.seq += 1;
        let index = ((self.seq - 1) as usize % self.total) + 1;
        let start = (index - 1) * self.chunk_bytes;
        let end = (start + self.chunk_bytes).min(self.envelope.payload.len());
        Ok(format!(
            "ur:{}/{}-{}/{}",
            self.envelope.kind.registry_name(),
            index,
            self.total,
            hex::encode(&self.envelope.payload[start..end]),
        ))
    }

    fn sequence_number(&self) -> u64 {
        self.seq
    }

    fn expected_parts(&self) -> Option<usize> {
        Some(self.total)
    }
}

pub struct ChunkDecoder {
    chunks: Vec<Option<Vec<u8>>>,
    kind: Option<EnvelopeKind>,
    processed: usize,
}

impl FountainDecoder for ChunkDecoder {
    fn receive_part(&mut self, part: &str) -> Result<(), FountainError> {
        let malformed = || FountainError::Part(part.to_string());
        let body = part.get(3..).ok_or_else(malformed)?;
        let mut fields = body.split('/');
        let kind = fields.next().ok_or_else(malformed)?;
        let counters = fields.next().ok_or_else(malformed)?;
        let chunk = fields.next().ok_or_else(malformed)?;
        let (index, total) = counters.split_once('-').ok_or_else(malformed)?;
        let index: usize = index.parse().map_err(|_| malformed())?;
        let total: usize = total.parse().map_err(|_| malformed())?;
        if index < 1 || index > total {
            return Err(malformed());
        }

        if self.chunks.is_empty() {
            self.chunks = vec![None; total];
            self.kind = Some(EnvelopeKind::from_registry_name(&kind.to_ascii_lowercase()));
        }
        let bytes = hex::decode(chunk.to_ascii_lowercase()).map_err(|_| malformed())?;
        if self.chunks[index - 1].is_none() {
            self.chunks[index - 1] = Some(bytes);
        }
        self.processed += 1;
        Ok(())
    }

    fn is_complete(&self) -> bool {
        !self.chunks.is_empty() && self.chunks.iter().all(Option::is_some)
    }

    fn is_success(&self) -> bool {
        self.is_complete()
    }

    fn result_message(&mut self) -> Result<Envelope, FountainError> {
        let kind = self
            .kind
            .clone()
            .ok_or_else(|| FountainError::Decode("no parts received".into()))?;
        let payload = self.chunks.iter().flatten().flatten().copied().collect();
        Ok(Envelope { kind, payload })
    }

    fn result_error(&self) -> String {
        "chunk decoder failed".into()
    }

    fn estimated_percent(&self) -> f32 {
        if self.chunks.is_empty() {
            0.0
        } else {
            self.chunks.iter().flatten().count() as f32 / self.chunks.len() as f32
        }
    }

    fn processed_parts(&self) -> usize {
        self.processed
    }

    fn expected_parts(&self) -> Option<usize> {
        if self.chunks.is_empty() {
            None
        } else {
            Some(self.chunks.len())
        }
    }
}

/// Wallet double that renders payloads in an easily asserted form.
pub struct TestWallet;

impl WalletCodec for TestWallet {
    fn account_descriptor(&self, payload: &[u8]) -> Result<String, WalletError> {
        Ok(format!("wpkh([{}])", hex::encode(payload)))
    }

    fn psbt_string(&self, payload: &[u8]) -> Result<String, WalletError> {
        Ok(format!("psbt:{}", hex::encode(payload)))
    }

    fn output_descriptor(&self, payload: &[u8]) -> Result<String, WalletError> {
        Ok(format!("raw({})", hex::encode(payload)))
    }
}

/// Stable pseudo-random bytes for payload material.
pub fn test_bytes(len: usize) -> Vec<u8> {
    (0..len as u32)
        .map(|i| (i.wrapping_mul(2654435761).rotate_left(11) >> 13) as u8)
        .collect()
}
