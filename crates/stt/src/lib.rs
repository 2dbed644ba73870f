//! Speech recognition boundary.
//!
//! The pipeline never interprets audio itself; it hands growing windows of
//! 16 kHz mono samples to an [`SttEngine`] together with a short context hint
//! and consumes the time-stamped segments that come back.

mod engine;
mod vad;
mod whisper;

pub use engine::{Segment, SttEngine};
pub use whisper::WhisperEngine;

/// Model size identifiers commonly used for whisper model files.
pub const KNOWN_MODEL_SIZES: &[&str] = &[
    "tiny", "base", "small", "medium", "large-v1", "large-v2", "large-v3", "large",
];

#[derive(Debug, thiserror::Error)]
pub enum SttError {
    #[error("model file not found: {0}")]
    ModelNotFound(std::path::PathBuf),
    #[error("model load failed: {0}")]
    ModelLoad(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
}

pub type Result<T> = std::result::Result<T, SttError>;
