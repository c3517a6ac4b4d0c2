//! Session configuration.
//!
//! Built once at startup and passed by value into
//! [`crate::ConnectionSession::new`].

use std::time::Duration;

/// Unacknowledged heartbeats tolerated before a forced reconnect
pub const MISSED_HEARTBEAT_THRESHOLD: u32 = 2;

/// Configuration for a [`crate::ConnectionSession`]
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// WebSocket URL, `ws://` or `wss://`
    pub url: String,

    /// Heartbeat interval (default: 30s)
    pub heartbeat_interval: Duration,

    /// Fixed delay between losing a connection and the next attempt (default: 5s)
    pub reconnect_delay: Duration,

    /// Capacity of the session event channel
    pub event_buffer: usize,

    /// Inbound frames larger than this are dropped (default: 16MB)
    pub max_message_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/ws".to_string(),
            heartbeat_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
            event_buffer: 256,
            max_message_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

impl SessionConfig {
    /// Configuration for `url` with default timings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set heartbeat interval
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set event channel capacity (at least 1)
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }

    /// Set maximum inbound frame size
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.max_message_size, 16 * 1024 * 1024);
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new("ws://chat.example.com/ws")
            .with_heartbeat_interval(Duration::from_millis(100))
            .with_reconnect_delay(Duration::from_millis(50))
            .with_event_buffer(0)
            .with_max_message_size(1024);

        assert_eq!(config.url, "ws://chat.example.com/ws");
        assert_eq!(config.heartbeat_interval, Duration::from_millis(100));
        assert_eq!(config.reconnect_delay, Duration::from_millis(50));
        assert_eq!(config.event_buffer, 1);
        assert_eq!(config.max_message_size, 1024);
    }
}
