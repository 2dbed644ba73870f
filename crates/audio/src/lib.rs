//! Microphone capture for the transcription pipeline.
//!
//! Everything downstream of this crate works on 16 kHz mono f32 samples;
//! device-native formats are folded to mono and resampled in the capture
//! callback.

mod capture;
mod chunk;
mod device;

pub use capture::CaptureStream;
pub use chunk::{AudioChunk, Chunker, CHUNK_DURATION_MS, CHUNK_SAMPLES};
pub use device::{find_device, get_default_device, list_devices, AudioDevice};

/// Sample rate every capture stream is resampled to.
pub const SAMPLE_RATE: u32 = 16000;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("stream error: {0}")]
    StreamError(String),
    #[error("device error: {0}")]
    DeviceError(#[from] cpal::DevicesError),
    #[error("build stream error: {0}")]
    BuildStreamError(#[from] cpal::BuildStreamError),
}

pub type Result<T> = std::result::Result<T, AudioError>;
