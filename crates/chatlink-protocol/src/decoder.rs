//! Two-phase inbound frame decoder.
//!
//! 1. Header: read the bytes as an [`Envelope`] to learn the command name.
//! 2. Dispatch: decode with the schema the [`Command`] table selects, or the
//!    generic [`Envelope`] when the command is unknown.
//!
//! When the selected schema rejects the bytes the decoder tries UTF-8 text,
//! then JSON, and finally hands back the bytes untouched. It never fails.

use bytes::Bytes;
use prost::Message as _;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::command::{Command, Schema, is_heartbeat_related};
use crate::schema::{DraftInput, EditMessage, Envelope, FileSendMessage, HeartbeatAck, PushMessage};

/// Typed result of decoding one inbound frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum DecodedMessage {
    /// Heartbeat acknowledgment (`heartbeat_ack`, `heartbeat`, `pong`)
    HeartbeatAck(HeartbeatAck),
    /// Pushed chat message
    PushMessage(PushMessage),
    /// Peer draft/typing update
    DraftInput(DraftInput),
    /// File delivery
    FileSendMessage(FileSendMessage),
    /// Message edit
    EditMessage(EditMessage),
    /// Command outside the dispatch table, decoded with the generic schema
    Envelope(Envelope),
    /// Bytes no schema accepted
    RawFallback(RawPayload),
}

/// Last-resort representation of an undecodable frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "value", rename_all = "snake_case")]
pub enum RawPayload {
    /// Bytes were a JSON document
    Json(Value),
    /// Bytes were UTF-8 text but not JSON
    Text(String),
    /// Bytes verbatim
    Bytes(#[serde(serialize_with = "serialize_bytes")] Bytes),
}

/// One decoded frame together with the command name it carried
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedFrame {
    /// Command name, `None` when it could not be determined
    pub command: Option<String>,
    /// Decoded body
    pub message: DecodedMessage,
}

impl DecodedFrame {
    /// Whether this frame resets heartbeat liveness tracking.
    ///
    /// Computed from the command name alone so every decode branch is
    /// classified the same way.
    pub fn is_heartbeat_ack(&self) -> bool {
        self.command.as_deref().is_some_and(is_heartbeat_related)
    }
}

/// Stateless inbound decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageDecoder;

impl MessageDecoder {
    /// Create a decoder
    pub fn new() -> Self {
        Self
    }

    /// Decode one inbound frame.
    pub fn decode(&self, raw: &[u8]) -> DecodedFrame {
        let command = peek_command(raw);
        let schema = command.as_deref().and_then(Command::parse).map(Command::schema);

        let decoded = match schema {
            Some(schema) => decode_with(schema, raw),
            None => Envelope::decode(raw).map(DecodedMessage::Envelope),
        };

        match decoded {
            Ok(message) => {
                trace!(command = ?command, "decoded frame");
                DecodedFrame { command, message }
            }
            Err(e) => {
                debug!(
                    command = ?command,
                    len = raw.len(),
                    "schema decode failed, falling back: {}",
                    e
                );
                fallback(raw, command)
            }
        }
    }
}

fn peek_command(raw: &[u8]) -> Option<String> {
    match Envelope::decode(raw) {
        Ok(envelope) => envelope.command().map(str::to_string),
        Err(e) => {
            trace!("envelope header decode failed: {}", e);
            None
        }
    }
}

fn decode_with(schema: Schema, raw: &[u8]) -> Result<DecodedMessage, prost::DecodeError> {
    Ok(match schema {
        Schema::HeartbeatAck => DecodedMessage::HeartbeatAck(HeartbeatAck::decode(raw)?),
        Schema::PushMessage => DecodedMessage::PushMessage(PushMessage::decode(raw)?),
        Schema::DraftInput => DecodedMessage::DraftInput(DraftInput::decode(raw)?),
        Schema::FileSendMessage => DecodedMessage::FileSendMessage(FileSendMessage::decode(raw)?),
        Schema::EditMessage => DecodedMessage::EditMessage(EditMessage::decode(raw)?),
    })
}

fn fallback(raw: &[u8], command: Option<String>) -> DecodedFrame {
    let Ok(text) = std::str::from_utf8(raw) else {
        return DecodedFrame {
            command,
            message: DecodedMessage::RawFallback(RawPayload::Bytes(Bytes::copy_from_slice(raw))),
        };
    };

    match serde_json::from_str::<Value>(text) {
        Ok(json) => {
            let command = command.or_else(|| json_command(&json));
            DecodedFrame {
                command,
                message: DecodedMessage::RawFallback(RawPayload::Json(json)),
            }
        }
        Err(_) => DecodedFrame {
            command,
            message: DecodedMessage::RawFallback(RawPayload::Text(text.to_string())),
        },
    }
}

/// `cmd` or `base.cmd` of a JSON fallback frame
fn json_command(json: &Value) -> Option<String> {
    json.get("cmd")
        .or_else(|| json.get("base").and_then(|base| base.get("cmd")))
        .and_then(Value::as_str)
        .filter(|cmd| !cmd.is_empty())
        .map(str::to_string)
}

fn serialize_bytes<S: serde::Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(bytes.iter())
}
