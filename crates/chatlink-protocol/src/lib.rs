//! # chatlink wire protocol
//!
//! Frame types shared by the realtime session and its callers.
//!
//! Outbound frames are JSON envelopes of the form `{seq, cmd, data}`.
//! Inbound frames are protobuf records whose first field is a base header
//! carrying the command name. The [`MessageDecoder`] reads that header,
//! picks a schema from the closed [`Command`] table and degrades to a text,
//! JSON or raw-byte fallback when the bytes do not fit.
//!
//! ## Usage
//!
//! ```rust
//! use chatlink_protocol::{MessageDecoder, DecodedMessage};
//!
//! let decoder = MessageDecoder::new();
//! let frame = decoder.decode(&[0xff, 0xff, 0xff]);
//! assert!(matches!(frame.message, DecodedMessage::RawFallback(_)));
//! assert!(!frame.is_heartbeat_ack());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod command;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod schema;

pub use command::{Command, Schema, is_heartbeat_related};
pub use decoder::{DecodedFrame, DecodedMessage, MessageDecoder, RawPayload};
pub use error::{ProtocolError, ProtocolResult};
pub use frame::{CMD_HEARTBEAT, CMD_LOGIN, LoginPayload, OutboundFrame, next_sequence_id};
pub use schema::{
    BaseHeader, DraftInput, EditMessage, Envelope, FileSendMessage, HeartbeatAck, PushMessage,
};
