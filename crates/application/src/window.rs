//! Rolling audio window fed to the recognizer.
//!
//! Uses a cursor-based approach with lazy compaction: trimming the settled
//! prefix is an O(1) cursor update, and memory is reclaimed once the dead
//! prefix crosses a threshold.

use habla_audio::SAMPLE_RATE;

/// Cursor offset that triggers physical compaction (1 second at 16 kHz).
const COMPACT_THRESHOLD: usize = 16000;

/// Growing sample buffer owned exclusively by the transcription worker.
///
/// The window grows until the stabilizer settles a prefix; growth before that
/// point is intentional, since truncating early would corrupt in-flight
/// recognition context. The front is only ever trimmed to a settle point
/// computed by the stabilizer, never rewritten in place.
#[derive(Debug, Default)]
pub struct AudioWindow {
    samples: Vec<f32>,
    start_cursor: usize,
}

impl AudioWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one captured chunk.
    pub fn push(&mut self, samples: &[f32]) {
        self.samples.extend_from_slice(samples);
    }

    /// The audio to hand to the recognizer.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples[self.start_cursor..]
    }

    #[inline]
    fn logical_len(&self) -> usize {
        self.samples.len() - self.start_cursor
    }

    pub fn len(&self) -> usize {
        self.logical_len()
    }

    pub fn is_empty(&self) -> bool {
        self.logical_len() == 0
    }

    /// Buffered duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (self.logical_len() as u64 * 1000) / SAMPLE_RATE as u64
    }

    /// Discard audio before `settle_point_ms`, relative to the window start.
    ///
    /// A zero settle point leaves the window untouched this cycle, and the
    /// trim never exceeds the buffered length. Returns the number of samples
    /// trimmed.
    pub fn trim_to(&mut self, settle_point_ms: u64) -> usize {
        let trim_samples =
            ((settle_point_ms as usize) * SAMPLE_RATE as usize / 1000).min(self.logical_len());
        if trim_samples == 0 {
            return 0;
        }

        self.start_cursor += trim_samples;
        if self.start_cursor >= COMPACT_THRESHOLD {
            self.compact();
        }
        trim_samples
    }

    /// Physically drop the dead prefix before the cursor.
    fn compact(&mut self) {
        if self.start_cursor > 0 {
            self.samples.drain(0..self.start_cursor);
            self.start_cursor = 0;
        }
    }
}
