/// One time-aligned piece of recognizer output.
///
/// Text is kept verbatim; whisper emits each segment with its own leading
/// space, so concatenating segment texts reconstructs the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    /// Start offset in milliseconds, relative to the supplied audio window.
    pub start_ms: u64,
    /// End offset in milliseconds, relative to the supplied audio window.
    pub end_ms: u64,
}

/// A speech-to-text engine callable synchronously and repeatedly on growing,
/// overlapping audio windows.
pub trait SttEngine: Send + Sync {
    /// Transcribe 16 kHz mono samples, biased by an optional context hint.
    ///
    /// Returned segments are ordered by ascending start and carry timestamps
    /// relative to the start of `audio`.
    fn transcribe(&self, audio: &[f32], hint: Option<&str>) -> crate::Result<Vec<Segment>>;

    fn model_name(&self) -> &str;
}
