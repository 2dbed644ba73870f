//! Core streaming transcription pipeline.
//!
//! Wires the capture queue, the recognizer, the segment stabilizer and the
//! prompt memory into a session with three execution units: capture,
//! transcription and broadcast. Units coordinate only through queues and one
//! shared tri-state flag; the worker is the single writer of window and
//! memory state.

mod config;
mod prompt;
mod session;
mod stabilizer;
mod window;
mod worker;

pub use config::{ConfigError, SessionConfig};
pub use prompt::PromptMemory;
pub use session::{Session, SessionFlag, SessionHandle, SessionState};
pub use stabilizer::{stabilize, Stabilization};
pub use window::AudioWindow;
pub use worker::{TranscriptUpdate, TranscriptionWorker};

/// Errors that can prevent or end a session, distinguishable by kind.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("device error: {0}")]
    Device(#[from] habla_audio::AudioError),
    #[error("recognition error: {0}")]
    Recognition(#[from] habla_stt::SttError),
    #[error("transport error: {0}")]
    Transport(#[from] habla_broadcast::TransportError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
