//! The transcription unit: one recognition cycle per captured chunk.

use std::sync::Arc;

use chrono::Utc;
use habla_audio::AudioChunk;
use habla_broadcast::{ClientRegistry, WireMessage};
use habla_queue::{QueueReceiver, QueueSender, StreamItem};
use habla_stt::SttEngine;

use crate::stabilizer::stabilize;
use crate::window::AudioWindow;
use crate::PromptMemory;

/// One incremental transcription result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptUpdate {
    /// Text settled by this cycle (a delta, not the cumulative transcript).
    pub settled: String,
    /// Current tentative tail.
    pub tentative: String,
}

/// Drives the main transcription loop.
///
/// Owns the audio window and the prompt memory; no other thread touches
/// either. The result queue and the broadcast registry receive events in the
/// same cycle order, though one sink may observe an event slightly before the
/// other.
pub struct TranscriptionWorker {
    engine: Arc<dyn SttEngine>,
    window: AudioWindow,
    memory: PromptMemory,
    patience_ms: u64,
    chunks: QueueReceiver<AudioChunk>,
    results: QueueSender<TranscriptUpdate>,
    broadcast: Option<ClientRegistry>,
    /// Cumulative settled transcript, sent to broadcast subscribers.
    full_transcript: String,
    cycles: u64,
}

impl TranscriptionWorker {
    pub fn new(
        engine: Arc<dyn SttEngine>,
        memory: PromptMemory,
        patience_ms: u64,
        chunks: QueueReceiver<AudioChunk>,
        results: QueueSender<TranscriptUpdate>,
        broadcast: Option<ClientRegistry>,
    ) -> Self {
        Self {
            engine,
            window: AudioWindow::new(),
            memory,
            patience_ms,
            chunks,
            results,
            broadcast,
            full_transcript: String::new(),
            cycles: 0,
        }
    }

    /// Consume chunks until the sentinel arrives or recognition fails.
    ///
    /// The terminal event is emitted on both paths so consumers always exit
    /// their loops; a recognition failure additionally propagates to the
    /// session runner, which stops the capture unit. Failed calls are not
    /// retried.
    pub fn run(mut self) -> crate::Result<()> {
        loop {
            match self.chunks.get() {
                StreamItem::Item(chunk) => {
                    if let Err(e) = self.run_cycle(chunk) {
                        tracing::error!(error = %e, cycle = self.cycles, "recognition failed, ending transcription");
                        self.results.close();
                        return Err(e.into());
                    }
                }
                StreamItem::EndOfStream => {
                    tracing::debug!(cycles = self.cycles, "capture stream ended");
                    self.results.close();
                    return Ok(());
                }
            }
        }
    }

    fn run_cycle(&mut self, chunk: AudioChunk) -> habla_stt::Result<()> {
        self.cycles += 1;
        self.window.push(&chunk.samples);

        let hint = self.memory.hint();
        let hint = if hint.trim().is_empty() {
            None
        } else {
            Some(hint)
        };
        let segments = self.engine.transcribe(self.window.samples(), hint.as_deref())?;

        let result = stabilize(&segments, self.window.duration_ms(), self.patience_ms);

        for segment in &segments[..result.settled_segments] {
            self.memory.push(segment.text.clone());
        }
        self.full_transcript.push_str(&result.settled_text);
        self.window.trim_to(result.settle_point_ms);

        tracing::debug!(
            cycle = self.cycles,
            chunk_seq = chunk.seq,
            segments = segments.len(),
            settled_segments = result.settled_segments,
            settle_point_ms = result.settle_point_ms,
            window_ms = self.window.duration_ms(),
            "cycle stabilized"
        );

        self.results.put(TranscriptUpdate {
            settled: result.settled_text.clone(),
            tentative: result.tentative_text.clone(),
        });

        if let Some(registry) = &self.broadcast {
            registry.publish(&WireMessage::Transcript {
                full_text: self.full_transcript.clone(),
                settled_delta: result.settled_text,
                tentative: result.tentative_text,
                timestamp: Utc::now(),
            });
        }

        Ok(())
    }
}
