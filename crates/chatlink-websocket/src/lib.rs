//! # Chatlink WebSocket Session
//!
//! Persistent, authenticated realtime session with the chat backend.
//!
//! ## Features
//!
//! - **Login handshake**: the login frame goes out before anything else on every connection
//! - **Heartbeat liveness**: two unacknowledged heartbeats force a reconnect
//! - **Automatic reconnection**: fixed delay, until the session is destroyed
//! - **Ordered delivery**: inbound frames are decoded and delivered in arrival order
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatlink_protocol::LoginPayload;
//! use chatlink_websocket::{ConnectionSession, SessionConfig, SessionEvent};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let login = LoginPayload {
//!     user_id: "u1".to_string(),
//!     token: "T".to_string(),
//!     platform: "linux-x86_64".to_string(),
//!     device_id: "d1".to_string(),
//! };
//! let (session, mut events) =
//!     ConnectionSession::new(SessionConfig::new("wss://chat.example.com/ws"), login);
//! session.connect().await?;
//!
//! while let Some(event) = events.recv().await {
//!     if let SessionEvent::Message(frame) = event {
//!         println!("{:?}: {:?}", frame.command, frame.message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! chatlink-websocket/
//! ├── config.rs     # SessionConfig and builders
//! ├── types.rs      # SessionState, SessionEvent
//! ├── heartbeat.rs  # HeartbeatMonitor
//! ├── session.rs    # ConnectionSession handle and driver task
//! └── error.rs      # SessionError
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod config;
pub mod error;
pub mod heartbeat;
pub mod session;
pub mod types;

pub use config::{MISSED_HEARTBEAT_THRESHOLD, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use heartbeat::{HeartbeatMonitor, Liveness};
pub use session::ConnectionSession;
pub use types::{SessionEvent, SessionState};
