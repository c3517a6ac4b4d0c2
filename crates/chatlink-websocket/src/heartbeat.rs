//! Heartbeat liveness tracking.
//!
//! The monitor owns the heartbeat ticker and the missed-acknowledgment
//! counter. The session sends the frame on every tick, reports it with
//! [`HeartbeatMonitor::on_sent`], and reports every inbound frame classified
//! as heartbeat-related with [`HeartbeatMonitor::on_inbound_classified_ack`].

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::trace;

use crate::config::MISSED_HEARTBEAT_THRESHOLD;

/// What the session must do after a heartbeat went out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Keep going
    Alive,
    /// Threshold reached; reconnect now
    ForceReconnect {
        /// Heartbeats sent without an acknowledgment
        missed: u32,
    },
}

/// Heartbeat ticker and missed counter; armed only while the socket is open
#[derive(Debug)]
pub struct HeartbeatMonitor {
    interval: Duration,
    threshold: u32,
    missed: u32,
    ticker: Option<Interval>,
}

impl HeartbeatMonitor {
    /// Monitor ticking every `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            threshold: MISSED_HEARTBEAT_THRESHOLD,
            missed: 0,
            ticker: None,
        }
    }

    /// Arm the ticker and reset the counter. The first tick fires one
    /// interval from now. Re-arming replaces any previous ticker.
    pub fn start(&mut self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        self.missed = 0;
    }

    /// Disarm the ticker and reset the counter
    pub fn stop(&mut self) {
        self.ticker = None;
        self.missed = 0;
    }

    /// Whether the ticker is armed
    pub fn is_armed(&self) -> bool {
        self.ticker.is_some()
    }

    /// Heartbeats sent since the last acknowledgment
    pub fn missed_count(&self) -> u32 {
        self.missed
    }

    /// Wait for the next tick. Never completes while disarmed.
    pub async fn tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Record an outbound heartbeat
    pub fn on_sent(&mut self) -> Liveness {
        self.missed += 1;
        trace!("heartbeat sent, {} unacknowledged", self.missed);
        if self.missed >= self.threshold {
            Liveness::ForceReconnect {
                missed: self.missed,
            }
        } else {
            Liveness::Alive
        }
    }

    /// Record an inbound heartbeat-related frame
    pub fn on_inbound_classified_ack(&mut self) {
        if self.missed > 0 {
            trace!("heartbeat acknowledged after {} sent", self.missed);
        }
        self.missed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_on_second_unacknowledged_heartbeat() {
        let mut monitor = HeartbeatMonitor::new(Duration::from_secs(30));
        assert_eq!(monitor.on_sent(), Liveness::Alive);
        assert_eq!(monitor.on_sent(), Liveness::ForceReconnect { missed: 2 });
    }

    #[test]
    fn test_ack_resets_counter() {
        let mut monitor = HeartbeatMonitor::new(Duration::from_secs(30));
        monitor.on_sent();
        monitor.on_inbound_classified_ack();
        assert_eq!(monitor.missed_count(), 0);
        assert_eq!(monitor.on_sent(), Liveness::Alive);
    }

    #[tokio::test]
    async fn test_start_and_stop_reset_counter() {
        let mut monitor = HeartbeatMonitor::new(Duration::from_secs(30));
        monitor.on_sent();
        monitor.start();
        assert!(monitor.is_armed());
        assert_eq!(monitor.missed_count(), 0);

        monitor.on_sent();
        monitor.stop();
        assert!(!monitor.is_armed());
        assert_eq!(monitor.missed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_interval() {
        let mut monitor = HeartbeatMonitor::new(Duration::from_secs(30));
        monitor.start();
        let started = Instant::now();

        monitor.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(30));

        monitor.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_monitor_never_ticks() {
        let mut monitor = HeartbeatMonitor::new(Duration::from_millis(10));
        let result = tokio::time::timeout(Duration::from_secs(1), monitor.tick()).await;
        assert!(result.is_err());
    }
}
