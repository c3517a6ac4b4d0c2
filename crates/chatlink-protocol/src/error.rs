//! Error types for frame encoding.
//!
//! Inbound decoding never fails; see [`crate::decoder`]. Only building an
//! outbound frame can produce a [`ProtocolError`].

use thiserror::Error;

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Error type for outbound frame construction
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload could not be serialized to JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Frame was built without a command name
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

impl ProtocolError {
    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create an invalid frame error
    #[must_use]
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
