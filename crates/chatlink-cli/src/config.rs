//! Application configuration.
//!
//! Loaded once at startup from an optional file plus `CHATLINK_`-prefixed
//! environment variables, then converted into the per-crate configuration
//! values. Durations are given in milliseconds.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chatlink_auth::{ApiConfig, EndpointPaths};
use chatlink_websocket::SessionConfig;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CHATLINK";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Realtime session
    pub session: SessionSection,
    /// Backend HTTP API
    pub api: ApiSection,
    /// Local persistence
    pub storage: StorageSection,
    /// CAPTCHA preview server
    pub captcha: CaptchaSection,
}

/// `[session]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// WebSocket endpoint (`ws://` or `wss://`)
    pub url: String,
    /// Interval between heartbeats
    pub heartbeat_interval_ms: u64,
    /// Pause before each reconnect attempt
    pub reconnect_delay_ms: u64,
    /// Capacity of the session event channel
    pub event_buffer: usize,
    /// Inbound frames larger than this are dropped
    pub max_message_size: usize,
}

impl Default for SessionSection {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            url: defaults.url,
            heartbeat_interval_ms: defaults.heartbeat_interval.as_millis() as u64,
            reconnect_delay_ms: defaults.reconnect_delay.as_millis() as u64,
            event_buffer: defaults.event_buffer,
            max_message_size: defaults.max_message_size,
        }
    }
}

/// `[api]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// Backend origin
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout_ms: u64,
    /// Attempts per logical request
    pub max_attempts: u32,
    /// Header carrying the token on identity lookups
    pub token_header: String,
    /// Endpoint paths relative to `base_url`
    pub endpoints: EndpointPaths,
}

impl Default for ApiSection {
    fn default() -> Self {
        let defaults = ApiConfig::default();
        Self {
            base_url: defaults.base_url,
            request_timeout_ms: defaults.request_timeout.as_millis() as u64,
            max_attempts: defaults.max_attempts,
            token_header: defaults.token_header,
            endpoints: defaults.endpoints,
        }
    }
}

/// `[storage]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Credential file, defaults to `<config dir>/chatlink/credential.json`
    pub credential_path: Option<PathBuf>,
}

/// `[captcha]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaSection {
    /// Address the preview server listens on
    pub bind_addr: String,
    /// Where the decoded image is written, defaults to the temp dir
    pub image_path: Option<PathBuf>,
}

impl Default for CaptchaSection {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8765".to_string(),
            image_path: None,
        }
    }
}

impl AppConfig {
    /// Load from `path` (if given) with `CHATLINK_` environment overrides.
    ///
    /// Nested keys use `__`, e.g. `CHATLINK_SESSION__URL`.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Load with a custom environment prefix
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> CliResult<Self> {
        use config::{Config, Environment, File, FileFormat};

        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(CliError::ConfigNotFound(path.to_path_buf()));
            }

            let format = match path.extension().and_then(|s| s.to_str()) {
                Some("toml") => FileFormat::Toml,
                Some("yaml") | Some("yml") => FileFormat::Yaml,
                Some("json") => FileFormat::Json,
                _ => return Err(CliError::UnsupportedFormat(path.display().to_string())),
            };

            let name = path
                .to_str()
                .ok_or_else(|| CliError::UnsupportedFormat(path.display().to_string()))?;
            builder = builder.add_source(File::new(name, format));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Reject values the session cannot run with
    pub fn validate(&self) -> CliResult<()> {
        let url = self.session.url.as_str();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(CliError::InvalidConfig(format!(
                "session.url must be a ws:// or wss:// URL, got '{url}'"
            )));
        }
        let base = self.api.base_url.as_str();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CliError::InvalidConfig(format!(
                "api.base_url must be an http:// or https:// URL, got '{base}'"
            )));
        }
        if self.session.heartbeat_interval_ms == 0 {
            return Err(CliError::InvalidConfig(
                "session.heartbeat_interval_ms must be positive".to_string(),
            ));
        }
        self.captcha_bind_addr()?;
        Ok(())
    }

    /// Realtime session configuration
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.session.url.clone())
            .with_heartbeat_interval(Duration::from_millis(self.session.heartbeat_interval_ms))
            .with_reconnect_delay(Duration::from_millis(self.session.reconnect_delay_ms))
            .with_event_buffer(self.session.event_buffer)
            .with_max_message_size(self.session.max_message_size)
    }

    /// Backend API configuration
    pub fn api_config(&self) -> ApiConfig {
        let config = ApiConfig::new(self.api.base_url.clone())
            .with_request_timeout(Duration::from_millis(self.api.request_timeout_ms))
            .with_max_attempts(self.api.max_attempts)
            .with_endpoints(self.api.endpoints.clone())
            .with_token_header(self.api.token_header.clone());
        match &self.captcha.image_path {
            Some(path) => config.with_captcha_path(path.clone()),
            None => config,
        }
    }

    /// Resolved credential file location
    pub fn credential_path(&self) -> PathBuf {
        self.storage.credential_path.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .map(|dir| dir.join("chatlink"))
                .unwrap_or_else(|| PathBuf::from(".chatlink"))
                .join("credential.json")
        })
    }

    /// Parsed CAPTCHA preview address
    pub fn captcha_bind_addr(&self) -> CliResult<SocketAddr> {
        self.captcha.bind_addr.parse().map_err(|e| {
            CliError::InvalidConfig(format!(
                "captcha.bind_addr '{}' is not a socket address: {}",
                self.captcha.bind_addr, e
            ))
        })
    }
}
