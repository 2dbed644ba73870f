use std::path::PathBuf;

use habla_broadcast::BroadcastConfig;

/// Invalid configuration surface values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Everything a transcription session needs to start.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Microphone selector, matched as a case-insensitive substring of the
    /// device name. `None` uses the default input device.
    pub device: Option<String>,
    /// Path to the speech model file.
    pub model_path: PathBuf,
    /// Source language hint for the recognizer, e.g. "es".
    pub language: Option<String>,
    /// Skip decoding windows that carry no speech energy.
    pub vad: bool,
    /// Number of settled fragments kept as recognizer context. Must be >= 1.
    pub memory: usize,
    /// Trailing audio kept provisional before being settled, in milliseconds.
    /// Must be > 0.
    pub patience_ms: u64,
    /// Seed text for the recognizer context.
    pub initial_prompt: String,
    /// Websocket fan-out endpoint, when enabled.
    pub broadcast: Option<BroadcastConfig>,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory < 1 {
            return Err(ConfigError::InvalidValue {
                field: "memory",
                value: self.memory.to_string(),
            });
        }
        if self.patience_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "patience_ms",
                value: self.patience_ms.to_string(),
            });
        }
        if let Some(broadcast) = &self.broadcast {
            if broadcast.host.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "broadcast.host",
                    value: broadcast.host.clone(),
                });
            }
            if broadcast.port == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "broadcast.port",
                    value: broadcast.port.to_string(),
                });
            }
        }
        Ok(())
    }
}
