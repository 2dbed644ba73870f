use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Messages sent to broadcast subscribers, one JSON object per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireMessage {
    /// Acknowledgement sent once when a subscriber connects.
    Connection { status: String },
    /// One transcription cycle.
    Transcript {
        /// Cumulative settled transcript since session start.
        full_text: String,
        /// Settled text added by this cycle.
        settled_delta: String,
        /// Text still subject to revision.
        tentative: String,
        timestamp: DateTime<Utc>,
    },
}

impl WireMessage {
    pub fn connected() -> Self {
        Self::Connection {
            status: "connected".to_string(),
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ack_shape() {
        let json = WireMessage::connected().to_json().unwrap();
        assert_eq!(json, r#"{"type":"connection","status":"connected"}"#);
    }

    #[test]
    fn test_transcript_roundtrip() {
        let message = WireMessage::Transcript {
            full_text: "hola mundo".into(),
            settled_delta: " mundo".into(),
            tentative: " como estas".into(),
            timestamp: Utc::now(),
        };
        let json = message.to_json().unwrap();
        assert!(json.contains(r#""type":"transcript""#));

        let parsed: WireMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, message);
    }
}
