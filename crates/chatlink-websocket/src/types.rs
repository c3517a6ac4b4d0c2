//! Session state and the events a session emits.

use std::fmt;

use chatlink_protocol::DecodedFrame;

/// Connection lifecycle.
///
/// `Idle -> Connecting -> Open -> Reconnecting -> Connecting -> ...`, and
/// `Destroyed` from anywhere. `Destroyed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created, `connect` not called yet
    Idle,
    /// Opening the socket
    Connecting,
    /// Socket usable, login sent, heartbeat armed
    Open,
    /// Waiting out the reconnect delay
    Reconnecting,
    /// Shut down for good
    Destroyed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Open => "open",
            SessionState::Reconnecting => "reconnecting",
            SessionState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Notifications delivered in order on the session event channel
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Lifecycle transition
    StateChanged(SessionState),
    /// Inbound frame, in socket arrival order
    Message(DecodedFrame),
    /// Socket closed, failed or could not be opened; a reconnect follows
    Disconnected {
        /// What happened
        reason: String,
    },
    /// Liveness lost; the socket was dropped without a close handshake
    ForcedReconnect {
        /// Why
        reason: String,
    },
}
