//! Backend API configuration.
//!
//! Built once at startup and handed to [`crate::ApiClient`]; nothing here is
//! read from ambient global state.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of attempts per logical request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Endpoint paths relative to [`ApiConfig::base_url`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPaths {
    /// Email + password login
    pub email_login: String,
    /// Phone + SMS code login
    pub verify_login: String,
    /// CAPTCHA image issuance
    pub captcha: String,
    /// SMS verification code issuance
    pub sms_code: String,
    /// Identity lookup for a token
    pub identity: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            email_login: "/api/v1/login/email".to_string(),
            verify_login: "/api/v1/login/verify".to_string(),
            captcha: "/api/v1/captcha".to_string(),
            sms_code: "/api/v1/sms/code".to_string(),
            identity: "/api/v1/user/info".to_string(),
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend origin, e.g. `https://chat.example.com`
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Attempts per logical request before giving up
    pub max_attempts: u32,
    /// Endpoint paths
    pub endpoints: EndpointPaths,
    /// Header carrying the token on identity lookups
    pub token_header: String,
    /// Where the most recent CAPTCHA image is written
    pub captcha_path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            request_timeout: Duration::from_secs(10),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            endpoints: EndpointPaths::default(),
            token_header: "token".to_string(),
            captcha_path: std::env::temp_dir().join("chatlink-captcha.png"),
        }
    }
}

impl ApiConfig {
    /// Configuration for `base_url` with defaults elsewhere
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the attempt budget per logical request
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Replace the endpoint paths
    pub fn with_endpoints(mut self, endpoints: EndpointPaths) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the identity lookup token header
    pub fn with_token_header(mut self, header: impl Into<String>) -> Self {
        self.token_header = header.into();
        self
    }

    /// Set where CAPTCHA images are written
    pub fn with_captcha_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.captcha_path = path.into();
        self
    }

    /// Absolute URL for an endpoint path
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.token_header, "token");
    }

    #[test]
    fn test_url_joins_cleanly() {
        let config = ApiConfig::new("http://host:1/");
        assert_eq!(config.url("/api/v1/captcha"), "http://host:1/api/v1/captcha");
        assert_eq!(config.url("api/v1/captcha"), "http://host:1/api/v1/captcha");
    }

    #[test]
    fn test_attempts_floor() {
        assert_eq!(ApiConfig::default().with_max_attempts(0).max_attempts, 1);
    }
}
