//! Connection session and its driver task.
//!
//! [`ConnectionSession`] is a handle. `connect` spawns one driver task that
//! owns the socket, the heartbeat monitor and the reconnect timer, so every
//! socket event and timer callback runs on a single logical thread of
//! control. The handle talks to the driver through a shutdown broadcast and
//! an outbound frame channel; the driver reports through [`SessionEvent`]s.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::{SinkExt as _, StreamExt as _};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, RwLock, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use chatlink_protocol::{DecodedFrame, LoginPayload, MessageDecoder, OutboundFrame};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::heartbeat::{HeartbeatMonitor, Liveness};
use crate::types::{SessionEvent, SessionState};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long `destroy` waits for the driver to close the socket
const DESTROY_GRACE: Duration = Duration::from_secs(1);

/// Persistent, authenticated session with the chat backend.
///
/// Reconnects after every close or error until [`ConnectionSession::destroy`]
/// is called.
pub struct ConnectionSession {
    session_id: String,
    config: Arc<SessionConfig>,
    login: Arc<LoginPayload>,
    state: Arc<RwLock<SessionState>>,
    destroyed: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    events_tx: mpsc::Sender<SessionEvent>,
    outbound_tx: mpsc::Sender<String>,
    outbound_rx: Mutex<Option<mpsc::Receiver<String>>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for ConnectionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSession")
            .field("session_id", &self.session_id)
            .field("url", &self.config.url)
            .field("user_id", &self.login.user_id)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

impl ConnectionSession {
    /// Create an idle session and the receiver for its events.
    ///
    /// The channel holds [`SessionConfig::event_buffer`] events. Lifecycle
    /// events wait for room; inbound [`SessionEvent::Message`]s are dropped
    /// with a warning while the channel is full, so a slow consumer never
    /// stalls heartbeats, reads or shutdown.
    pub fn new(config: SessionConfig, login: LoginPayload) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer.max(1));
        let (outbound_tx, outbound_rx) = mpsc::channel(config.event_buffer.max(1));
        let (shutdown_tx, _) = broadcast::channel(1);

        let session = Self {
            session_id: Uuid::new_v4().to_string(),
            config: Arc::new(config),
            login: Arc::new(login),
            state: Arc::new(RwLock::new(SessionState::Idle)),
            destroyed: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            events_tx,
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            driver: Mutex::new(None),
        };
        (session, events_rx)
    }

    /// Session id used in logs
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// Whether `destroy` has been called
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Start the session. Calling it again while it runs does nothing.
    ///
    /// # Errors
    ///
    /// [`SessionError::Destroyed`] after [`Self::destroy`].
    pub async fn connect(&self) -> SessionResult<()> {
        if self.is_destroyed() {
            return Err(SessionError::Destroyed);
        }

        let mut driver = self.driver.lock().await;
        if driver.is_some() {
            debug!("session {} already running", self.session_id);
            return Ok(());
        }
        // re-check under the lock: destroy may have run in between
        if self.is_destroyed() {
            return Err(SessionError::Destroyed);
        }
        let outbound_rx = self
            .outbound_rx
            .lock()
            .await
            .take()
            .ok_or(SessionError::ChannelClosed)?;

        let task = Driver {
            session_id: self.session_id.clone(),
            config: Arc::clone(&self.config),
            login: Arc::clone(&self.login),
            state: Arc::clone(&self.state),
            destroyed: Arc::clone(&self.destroyed),
            events_tx: self.events_tx.clone(),
            shutdown_rx: self.shutdown_tx.subscribe(),
            outbound_rx,
            decoder: MessageDecoder::new(),
            heartbeat: HeartbeatMonitor::new(self.config.heartbeat_interval),
            dropped_messages: 0,
        };
        *driver = Some(tokio::spawn(task.run()));
        Ok(())
    }

    /// Send an application frame `{seq, cmd, data}`.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotOpen`] unless the socket is open,
    /// [`SessionError::Destroyed`] after [`Self::destroy`].
    pub async fn send(&self, cmd: &str, data: Value) -> SessionResult<()> {
        if self.is_destroyed() {
            return Err(SessionError::Destroyed);
        }
        let state = self.state().await;
        if state != SessionState::Open {
            return Err(SessionError::NotOpen(state));
        }
        let text = OutboundFrame::new(cmd, data)?.to_json()?;
        self.outbound_tx
            .send(text)
            .await
            .map_err(|_| SessionError::ChannelClosed)
    }

    /// Shut the session down for good.
    ///
    /// Sets the destroyed flag first, then stops the driver: the heartbeat
    /// is disarmed, a pending reconnect timer is cancelled and an open
    /// socket is closed. No connection attempt starts afterwards.
    pub async fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.state.write().await = SessionState::Destroyed;
        info!("session {} destroyed", self.session_id);

        let _ = self.shutdown_tx.send(());
        let handle = self.driver.lock().await.take();
        if let Some(mut handle) = handle
            && tokio::time::timeout(DESTROY_GRACE, &mut handle).await.is_err()
        {
            warn!(
                "session {} driver did not stop within {:?}, aborting",
                self.session_id, DESTROY_GRACE
            );
            handle.abort();
        }

        let _ = self
            .events_tx
            .try_send(SessionEvent::StateChanged(SessionState::Destroyed));
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        self.destroyed.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }
}

/// Why an open connection ended
enum Ended {
    Destroyed,
    Closed(String),
    Forced,
}

struct Driver {
    session_id: String,
    config: Arc<SessionConfig>,
    login: Arc<LoginPayload>,
    state: Arc<RwLock<SessionState>>,
    destroyed: Arc<AtomicBool>,
    events_tx: mpsc::Sender<SessionEvent>,
    shutdown_rx: broadcast::Receiver<()>,
    outbound_rx: mpsc::Receiver<String>,
    decoder: MessageDecoder,
    heartbeat: HeartbeatMonitor,
    dropped_messages: u64,
}

impl Driver {
    async fn run(mut self) {
        debug!("session {} driver started", self.session_id);

        loop {
            if self.is_destroyed() {
                break;
            }
            self.transition(SessionState::Connecting).await;

            let connected = tokio::select! {
                _ = self.shutdown_rx.recv() => break,
                result = connect_async(self.config.url.as_str()) => result,
            };

            let reason = match connected {
                Ok((ws, _)) => match self.run_open(ws).await {
                    Ended::Destroyed => break,
                    Ended::Closed(reason) => Some(reason),
                    Ended::Forced => None,
                },
                Err(e) => Some(format!("connect to {} failed: {e}", self.config.url)),
            };

            self.heartbeat.stop();
            if self.is_destroyed() {
                break;
            }
            if let Some(reason) = reason {
                warn!("session {} disconnected: {}", self.session_id, reason);
                self.emit(SessionEvent::Disconnected { reason }).await;
            }
            self.transition(SessionState::Reconnecting).await;

            tokio::select! {
                _ = self.shutdown_rx.recv() => break,
                _ = sleep(self.config.reconnect_delay) => {}
            }
            if self.is_destroyed() {
                debug!("session {} reconnect suppressed after destroy", self.session_id);
                break;
            }
        }

        self.heartbeat.stop();
        debug!("session {} driver stopped", self.session_id);
    }

    async fn run_open(&mut self, ws: WsStream) -> Ended {
        let (mut sink, mut stream) = ws.split();

        let login = match OutboundFrame::login(&self.login).and_then(|frame| frame.to_json()) {
            Ok(text) => text,
            Err(e) => return Ended::Closed(format!("cannot build login frame: {e}")),
        };
        if let Err(e) = sink.send(Message::Text(login.into())).await {
            return Ended::Closed(format!("login send failed: {e}"));
        }
        debug!("session {} login frame sent", self.session_id);

        self.transition(SessionState::Open).await;
        self.heartbeat.start();

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    self.heartbeat.stop();
                    let _ = sink.send(Message::Close(None)).await;
                    return Ended::Destroyed;
                }

                frame = stream.next() => match frame {
                    Some(Ok(Message::Binary(data))) => self.on_frame(&data),
                    Some(Ok(Message::Text(text))) => self.on_frame(text.as_bytes()),
                    Some(Ok(Message::Close(close))) => {
                        self.heartbeat.stop();
                        return Ended::Closed(match close {
                            Some(close) => format!(
                                "closed by server: {} {}",
                                u16::from(close.code),
                                close.reason.as_str()
                            ),
                            None => "closed by server".to_string(),
                        });
                    }
                    Some(Ok(_)) => trace!("session {} control frame", self.session_id),
                    Some(Err(e)) => {
                        self.heartbeat.stop();
                        return Ended::Closed(format!("socket error: {e}"));
                    }
                    None => {
                        self.heartbeat.stop();
                        return Ended::Closed("socket stream ended".to_string());
                    }
                },

                _ = self.heartbeat.tick() => {
                    if self.is_destroyed() {
                        self.heartbeat.stop();
                        return Ended::Destroyed;
                    }
                    let text = match OutboundFrame::heartbeat(&self.login.user_id).to_json() {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("session {} cannot build heartbeat frame: {}", self.session_id, e);
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        self.heartbeat.stop();
                        return Ended::Closed(format!("heartbeat send failed: {e}"));
                    }
                    if let Liveness::ForceReconnect { missed } = self.heartbeat.on_sent() {
                        // drop both halves without a close handshake
                        drop(sink);
                        drop(stream);
                        self.force_reconnect(format!("{missed} heartbeats unacknowledged")).await;
                        return Ended::Forced;
                    }
                }

                Some(text) = self.outbound_rx.recv() => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        self.heartbeat.stop();
                        return Ended::Closed(format!("send failed: {e}"));
                    }
                }
            }
        }
    }

    fn on_frame(&mut self, raw: &[u8]) {
        if raw.len() > self.config.max_message_size {
            warn!(
                "session {} dropped {} byte frame (limit {})",
                self.session_id,
                raw.len(),
                self.config.max_message_size
            );
            return;
        }

        let frame = self.decoder.decode(raw);
        if frame.is_heartbeat_ack() {
            self.heartbeat.on_inbound_classified_ack();
        }
        trace!(
            "session {} received {}",
            self.session_id,
            frame.command.as_deref().unwrap_or("<unknown>")
        );
        self.deliver(frame);
    }

    fn deliver(&mut self, frame: DecodedFrame) {
        match self.events_tx.try_send(SessionEvent::Message(frame)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped_messages += 1;
                warn!(
                    "session {} event channel full, dropped inbound frame ({} dropped so far)",
                    self.session_id, self.dropped_messages
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                trace!("session {} event receiver dropped", self.session_id);
            }
        }
    }

    async fn force_reconnect(&mut self, reason: String) {
        self.heartbeat.stop();
        warn!("session {} forcing reconnect: {}", self.session_id, reason);
        self.emit(SessionEvent::ForcedReconnect { reason }).await;
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    async fn transition(&self, next: SessionState) {
        {
            let mut state = self.state.write().await;
            if *state == SessionState::Destroyed || *state == next {
                return;
            }
            info!("session {}: {} -> {}", self.session_id, *state, next);
            *state = next;
        }
        self.emit(SessionEvent::StateChanged(next)).await;
    }

    async fn emit(&self, event: SessionEvent) {
        if self.events_tx.send(event).await.is_err() {
            trace!("session {} event receiver dropped", self.session_id);
        }
    }
}
