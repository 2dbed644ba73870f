//! Websocket fan-out for live transcript subscribers.
//!
//! The transcription worker publishes through a [`ClientRegistry`]; each
//! accepted websocket gets a per-connection task that forwards registry
//! messages to the socket. A subscriber that cannot receive is dropped from
//! the set, never queued for.

mod registry;
mod server;
mod wire;

pub use registry::ClientRegistry;
pub use server::{BroadcastConfig, BroadcastServer};
pub use wire::WireMessage;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("failed to start broadcast server thread: {0}")]
    ServerStart(String),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
