//! Session errors.

use thiserror::Error;

use chatlink_protocol::ProtocolError;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors returned by [`crate::ConnectionSession`] methods.
///
/// Socket failures are not errors: they drive the reconnect cycle and are
/// reported as [`crate::SessionEvent::Disconnected`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The session was destroyed and cannot be used again
    #[error("session destroyed")]
    Destroyed,

    /// The socket is not open
    #[error("session not open (state: {0})")]
    NotOpen(crate::SessionState),

    /// Outbound frame could not be built
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The session driver is no longer running
    #[error("session channel closed")]
    ChannelClosed,
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> Self {
        Self::Serialization(err.to_string())
    }
}
