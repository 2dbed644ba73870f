use std::sync::Arc;

use crate::SAMPLE_RATE;

/// Duration of one capture chunk in milliseconds.
///
/// Each chunk triggers one recognition cycle downstream, so this also sets
/// the update cadence of the transcript.
pub const CHUNK_DURATION_MS: u32 = 500;

/// Number of samples per chunk at the pipeline sample rate.
pub const CHUNK_SAMPLES: usize = (SAMPLE_RATE as usize * CHUNK_DURATION_MS as usize) / 1000;

/// One fixed-size read from the capture device.
///
/// Chunks are immutable after capture and consumed exactly once by the audio
/// window; `seq` records arrival order.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Monotonic arrival order.
    pub seq: u64,
    /// Audio samples (shared ownership, never mutated after capture).
    pub samples: Arc<[f32]>,
}

impl AudioChunk {
    pub fn new(seq: u64, samples: impl Into<Arc<[f32]>>) -> Self {
        Self {
            seq,
            samples: samples.into(),
        }
    }

    pub fn duration_ms(&self) -> u64 {
        (self.samples.len() as u64 * 1000) / SAMPLE_RATE as u64
    }
}

/// Re-slices variable-size capture callbacks into fixed `CHUNK_SAMPLES`
/// chunks.
#[derive(Debug, Default)]
pub struct Chunker {
    pending: Vec<f32>,
    next_seq: u64,
}

impl Chunker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed captured samples; returns every complete chunk now available.
    pub fn push(&mut self, samples: &[f32]) -> Vec<AudioChunk> {
        self.pending.extend_from_slice(samples);

        let mut chunks = Vec::new();
        while self.pending.len() >= CHUNK_SAMPLES {
            let frame: Vec<f32> = self.pending.drain(..CHUNK_SAMPLES).collect();
            chunks.push(AudioChunk::new(self.next_seq, frame));
            self.next_seq += 1;
        }
        chunks
    }

    /// Samples held back because they never filled a whole chunk.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_duration() {
        let chunk = AudioChunk::new(0, vec![0.0; CHUNK_SAMPLES]);
        assert_eq!(chunk.duration_ms(), CHUNK_DURATION_MS as u64);
    }

    #[test]
    fn test_chunker_emits_fixed_sizes() {
        let mut chunker = Chunker::new();

        assert!(chunker.push(&vec![0.0; CHUNK_SAMPLES / 2]).is_empty());
        assert_eq!(chunker.pending_len(), CHUNK_SAMPLES / 2);

        let chunks = chunker.push(&vec![0.0; CHUNK_SAMPLES]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].samples.len(), CHUNK_SAMPLES);
        assert_eq!(chunker.pending_len(), CHUNK_SAMPLES / 2);
    }

    #[test]
    fn test_chunker_sequences_are_monotonic() {
        let mut chunker = Chunker::new();
        let chunks = chunker.push(&vec![0.0; CHUNK_SAMPLES * 3]);
        assert_eq!(chunks.len(), 3);
        let seqs: Vec<u64> = chunks.iter().map(|c| c.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }
}
