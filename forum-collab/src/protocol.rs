//! Binary framing for realtime snapshot pushes.
//!
//! Wire format (bincode-encoded):
//! ```text
//! ┌──────────┬────────────────────────────────────┐
//! │ sequence │ snapshot                           │
//! │ varint   │ scope + full ordered document list │
//! └──────────┴────────────────────────────────────┘
//! ```
//!
//! `sequence` is assigned by the backend on every write and grows
//! monotonically across all scopes. A receiver drops any frame whose
//! sequence is not newer than the last one it delivered, so a late frame
//! can never overwrite a newer snapshot.

use forum_core::Snapshot;
use serde::{Deserialize, Serialize};

/// One pushed snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFrame {
    pub sequence: u64,
    pub snapshot: Snapshot,
}

impl SnapshotFrame {
    pub fn new(sequence: u64, snapshot: Snapshot) -> Self {
        Self { sequence, snapshot }
    }

    /// Serialize to binary wire format.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| ProtocolError::SerializationError(e.to_string()))
    }

    /// Deserialize from binary wire format.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (frame, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| ProtocolError::DeserializationError(e.to_string()))?;
        Ok(frame)
    }
}

/// Protocol errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    SerializationError(String),
    DeserializationError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SerializationError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializationError(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}
