//! Protobuf schemas of inbound frames.
//!
//! Every inbound record carries a [`BaseHeader`] in field 1. The remaining
//! fields depend on the command. [`Envelope`] declares only the header so it
//! can read any frame; it is used both to read the command name and as the
//! generic schema for commands outside the dispatch table.

use serde::Serialize;

/// Header shared by every inbound frame
#[derive(Clone, PartialEq, Serialize, prost::Message)]
pub struct BaseHeader {
    /// Command name, matched case-insensitively
    #[prost(string, tag = "1")]
    pub cmd: String,
    /// Server sequence id
    #[prost(string, tag = "2")]
    pub seq: String,
    /// Server status code
    #[prost(int32, tag = "3")]
    pub code: i32,
    /// Server status message
    #[prost(string, tag = "4")]
    pub msg: String,
}

/// Header-only view of any frame
#[derive(Clone, PartialEq, Serialize, prost::Message)]
pub struct Envelope {
    /// Base header
    #[prost(message, optional, tag = "1")]
    pub base: Option<BaseHeader>,
}

/// Server acknowledgment of a heartbeat
#[derive(Clone, PartialEq, Serialize, prost::Message)]
pub struct HeartbeatAck {
    /// Base header
    #[prost(message, optional, tag = "1")]
    pub base: Option<BaseHeader>,
    /// Server time in milliseconds
    #[prost(int64, tag = "2")]
    pub server_time: i64,
}

/// A chat message pushed by the server
#[derive(Clone, PartialEq, Serialize, prost::Message)]
pub struct PushMessage {
    /// Base header
    #[prost(message, optional, tag = "1")]
    pub base: Option<BaseHeader>,
    /// Server message id
    #[prost(string, tag = "2")]
    pub msg_id: String,
    /// Conversation the message belongs to
    #[prost(string, tag = "3")]
    pub conversation_id: String,
    /// Sender user id
    #[prost(string, tag = "4")]
    pub from_user: String,
    /// Recipient user id
    #[prost(string, tag = "5")]
    pub to_user: String,
    /// Message body
    #[prost(string, tag = "6")]
    pub content: String,
    /// Message kind code
    #[prost(int32, tag = "7")]
    pub msg_type: i32,
    /// Send time in milliseconds
    #[prost(int64, tag = "8")]
    pub timestamp: i64,
}

/// A typing/draft notification from the peer
#[derive(Clone, PartialEq, Serialize, prost::Message)]
pub struct DraftInput {
    /// Base header
    #[prost(message, optional, tag = "1")]
    pub base: Option<BaseHeader>,
    /// Conversation being drafted in
    #[prost(string, tag = "2")]
    pub conversation_id: String,
    /// Drafting user id
    #[prost(string, tag = "3")]
    pub from_user: String,
    /// Current draft text
    #[prost(string, tag = "4")]
    pub text: String,
}

/// A file delivered into a conversation
#[derive(Clone, PartialEq, Serialize, prost::Message)]
pub struct FileSendMessage {
    /// Base header
    #[prost(message, optional, tag = "1")]
    pub base: Option<BaseHeader>,
    /// Server message id
    #[prost(string, tag = "2")]
    pub msg_id: String,
    /// Conversation the file was sent to
    #[prost(string, tag = "3")]
    pub conversation_id: String,
    /// Sender user id
    #[prost(string, tag = "4")]
    pub from_user: String,
    /// Original file name
    #[prost(string, tag = "5")]
    pub file_name: String,
    /// Download location
    #[prost(string, tag = "6")]
    pub file_url: String,
    /// Size in bytes
    #[prost(int64, tag = "7")]
    pub file_size: i64,
    /// MIME type of the file
    #[prost(string, tag = "8")]
    pub mime_type: String,
}

/// An edit to a previously delivered message
#[derive(Clone, PartialEq, Serialize, prost::Message)]
pub struct EditMessage {
    /// Base header
    #[prost(message, optional, tag = "1")]
    pub base: Option<BaseHeader>,
    /// Id of the edited message
    #[prost(string, tag = "2")]
    pub msg_id: String,
    /// Conversation of the edited message
    #[prost(string, tag = "3")]
    pub conversation_id: String,
    /// Replacement body
    #[prost(string, tag = "4")]
    pub content: String,
    /// Edit time in milliseconds
    #[prost(int64, tag = "5")]
    pub edited_at: i64,
}

impl BaseHeader {
    /// Header with only the command set
    pub fn for_command(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            ..Self::default()
        }
    }
}

impl Envelope {
    /// Command name carried by the header, if any
    pub fn command(&self) -> Option<&str> {
        self.base
            .as_ref()
            .map(|b| b.cmd.as_str())
            .filter(|cmd| !cmd.is_empty())
    }
}
