//! Closed command table for inbound frames.
//!
//! Adding a command means adding a [`Command`] variant, which forces the
//! exhaustive [`Command::schema`] match to say how it decodes.

use std::fmt;

/// Commands with a dedicated inbound schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `heartbeat_ack` (also accepted as `heartbeat-ack`)
    HeartbeatAck,
    /// `heartbeat` echoed back by the server
    Heartbeat,
    /// `pong`
    Pong,
    /// `push_message`
    PushMessage,
    /// `draft_input`
    DraftInput,
    /// `file_send_message`
    FileSendMessage,
    /// `edit_message`
    EditMessage,
}

/// Inbound decode schema selected by a [`Command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    /// [`crate::HeartbeatAck`]
    HeartbeatAck,
    /// [`crate::PushMessage`]
    PushMessage,
    /// [`crate::DraftInput`]
    DraftInput,
    /// [`crate::FileSendMessage`]
    FileSendMessage,
    /// [`crate::EditMessage`]
    EditMessage,
}

impl Command {
    /// Every command in the table
    pub const ALL: [Command; 7] = [
        Command::HeartbeatAck,
        Command::Heartbeat,
        Command::Pong,
        Command::PushMessage,
        Command::DraftInput,
        Command::FileSendMessage,
        Command::EditMessage,
    ];

    /// Canonical wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Command::HeartbeatAck => "heartbeat_ack",
            Command::Heartbeat => "heartbeat",
            Command::Pong => "pong",
            Command::PushMessage => "push_message",
            Command::DraftInput => "draft_input",
            Command::FileSendMessage => "file_send_message",
            Command::EditMessage => "edit_message",
        }
    }

    /// Look up a wire name, ignoring ASCII case and treating `-` as `_`.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|command| command.as_str() == normalized)
    }

    /// Schema used to decode frames of this command
    pub fn schema(self) -> Schema {
        match self {
            Command::HeartbeatAck | Command::Heartbeat | Command::Pong => Schema::HeartbeatAck,
            Command::PushMessage => Schema::PushMessage,
            Command::DraftInput => Schema::DraftInput,
            Command::FileSendMessage => Schema::FileSendMessage,
            Command::EditMessage => Schema::EditMessage,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a command name marks a liveness acknowledgment.
///
/// Substring match, case-insensitive, on `heartbeat` or `pong`, so names
/// outside the dispatch table (`server_heartbeat_v2`) also count.
pub fn is_heartbeat_related(command: &str) -> bool {
    let lower = command.to_ascii_lowercase();
    lower.contains("heartbeat") || lower.contains("pong")
}
