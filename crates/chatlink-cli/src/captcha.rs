//! Local HTTP preview of the current CAPTCHA image

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use chatlink_auth::{AuthError, AuthResult, CaptchaSink};
use tokio::sync::{Mutex, RwLock, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Path the image is served under
pub const CAPTCHA_ROUTE: &str = "/captcha";

type ImageSlot = Arc<RwLock<Option<Vec<u8>>>>;

#[derive(Debug)]
struct RunningServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Serves the most recently published CAPTCHA at `GET /captcha`.
///
/// The server only runs between [`CaptchaSink::start`] and
/// [`CaptchaSink::stop`], i.e. for the duration of one phone login.
#[derive(Debug)]
pub struct AxumCaptchaSink {
    bind_addr: SocketAddr,
    image: ImageSlot,
    server: Mutex<Option<RunningServer>>,
}

impl AxumCaptchaSink {
    /// Sink listening on `bind_addr` once started
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            image: Arc::new(RwLock::new(None)),
            server: Mutex::new(None),
        }
    }

    /// Address actually bound, while running
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.server.lock().await.as_ref().map(|server| server.addr)
    }

    fn router(&self) -> Router {
        Router::new()
            .route(CAPTCHA_ROUTE, get(captcha_handler))
            .with_state(Arc::clone(&self.image))
    }
}

async fn captcha_handler(State(image): State<ImageSlot>) -> Response {
    match image.read().await.as_ref() {
        Some(bytes) => (
            [(header::CONTENT_TYPE, image_content_type(bytes))],
            bytes.clone(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "no CAPTCHA issued yet").into_response(),
    }
}

/// Content type from the image magic bytes
fn image_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG") {
        "image/png"
    } else if bytes.starts_with(b"\xFF\xD8\xFF") {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "application/octet-stream"
    }
}

#[async_trait]
impl CaptchaSink for AxumCaptchaSink {
    async fn start(&self) -> AuthResult<()> {
        let mut server = self.server.lock().await;
        if server.is_some() {
            return Ok(());
        }

        let listener = tokio::net::TcpListener::bind(self.bind_addr)
            .await
            .map_err(|e| AuthError::captcha(format!("failed to bind {}: {}", self.bind_addr, e)))?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let (shutdown, signal) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = signal.await;
            });
            if let Err(e) = graceful.await {
                error!("CAPTCHA server error: {}", e);
            }
        });

        debug!("CAPTCHA server listening on {}", addr);
        *server = Some(RunningServer {
            addr,
            shutdown,
            handle,
        });
        Ok(())
    }

    async fn publish(&self, image: &Path) -> AuthResult<()> {
        let bytes = tokio::fs::read(image).await.map_err(|e| {
            AuthError::captcha(format!("failed to read {}: {}", image.display(), e))
        })?;
        *self.image.write().await = Some(bytes);

        match self.local_addr().await {
            Some(addr) => info!("CAPTCHA ready: open http://{}{}", addr, CAPTCHA_ROUTE),
            None => info!("CAPTCHA ready: see {}", image.display()),
        }
        Ok(())
    }

    async fn stop(&self) {
        let Some(RunningServer {
            shutdown,
            mut handle,
            ..
        }) = self.server.lock().await.take()
        else {
            return;
        };

        let _ = shutdown.send(());
        if tokio::time::timeout(Duration::from_secs(1), &mut handle)
            .await
            .is_err()
        {
            warn!("CAPTCHA server did not stop in time, aborting");
            handle.abort();
            let _ = handle.await;
        }
        *self.image.write().await = None;
    }
}
