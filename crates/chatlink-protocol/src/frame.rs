//! Outbound JSON frames.
//!
//! Every frame the client writes is `{seq, cmd, data}`. The `seq` value is
//! generated per frame from the current wall-clock milliseconds followed by a
//! random integer.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{ProtocolError, ProtocolResult};

/// Command name of the login frame sent right after the socket opens
pub const CMD_LOGIN: &str = "login";

/// Command name of the periodic liveness frame
pub const CMD_HEARTBEAT: &str = "heartbeat";

/// Generate a collision-resistant sequence id.
pub fn next_sequence_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{}{}", millis, fastrand::u32(..))
}

/// A client-to-server frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// Per-frame sequence id
    pub seq: String,
    /// Command name
    pub cmd: String,
    /// Command payload
    pub data: Value,
}

/// Payload of the `login` frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    /// Backend user id
    pub user_id: String,
    /// Validated session token
    pub token: String,
    /// Platform label of this installation
    pub platform: String,
    /// Stable device id of this installation
    pub device_id: String,
}

impl OutboundFrame {
    /// Build a frame with a fresh sequence id.
    pub fn new(cmd: impl Into<String>, data: Value) -> ProtocolResult<Self> {
        let cmd = cmd.into();
        if cmd.trim().is_empty() {
            return Err(ProtocolError::invalid_frame("command name is empty"));
        }
        Ok(Self {
            seq: next_sequence_id(),
            cmd,
            data,
        })
    }

    /// Build the login frame.
    pub fn login(payload: &LoginPayload) -> ProtocolResult<Self> {
        Self::new(CMD_LOGIN, serde_json::to_value(payload)?)
    }

    /// Build a heartbeat frame for `user_id`.
    pub fn heartbeat(user_id: &str) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            seq: next_sequence_id(),
            cmd: CMD_HEARTBEAT.to_string(),
            data: json!({ "userId": user_id, "timestamp": timestamp }),
        }
    }

    /// Serialize to the JSON text written on the socket.
    pub fn to_json(&self) -> ProtocolResult<String> {
        serde_json::to_string(self).map_err(Into::into)
    }
}
