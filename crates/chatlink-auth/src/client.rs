//! HTTP client for the backend JSON API.
//!
//! Every response body is the envelope `{code, msg, data}`; `code == 1`
//! is the success sentinel. A single attempt is classified into an
//! [`Outcome`]; the retried variants run it under the shared
//! [`RetryPolicy`].

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::config::ApiConfig;
use crate::error::{AuthError, AuthResult};
use crate::retry::{Completed, Outcome, RetryPolicy};

/// Success sentinel in the `code` field
pub const SUCCESS_CODE: i64 = 1;

/// Response envelope shared by every endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiResponse {
    /// `1` on success; required, a body without it is not an envelope
    pub code: i64,
    /// Human-readable reason, present on rejection
    #[serde(default)]
    pub msg: Option<String>,
    /// Endpoint-specific payload
    #[serde(default)]
    pub data: Option<Value>,
}

impl ApiResponse {
    /// Classify by the success sentinel.
    pub fn into_outcome(self) -> Outcome<Value> {
        if self.code == SUCCESS_CODE {
            Outcome::Success(self.data.unwrap_or(Value::Null))
        } else {
            Outcome::Rejected(
                self.msg
                    .filter(|msg| !msg.is_empty())
                    .unwrap_or_else(|| format!("request declined with code {}", self.code)),
            )
        }
    }
}

/// Backend API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
    policy: RetryPolicy,
}

impl ApiClient {
    /// Build a client; the request timeout applies to every call.
    pub fn new(config: ApiConfig) -> AuthResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuthError::Config(e.to_string()))?;
        let policy = RetryPolicy::new(config.max_attempts);
        Ok(Self {
            http,
            config: Arc::new(config),
            policy,
        })
    }

    /// Configuration this client was built with
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Retry policy applied by [`Self::post`] and [`Self::get_with_token`]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// One POST attempt with a JSON body.
    pub async fn post_once(&self, path: &str, body: &Value) -> Outcome<Value> {
        let url = self.config.url(path);
        trace!("POST {}", url);
        classify(self.http.post(&url).json(body).send().await).await
    }

    /// One GET attempt with the token attached as a header.
    pub async fn get_once(&self, path: &str, token: &str) -> Outcome<Value> {
        let url = self.config.url(path);
        trace!("GET {}", url);
        classify(
            self.http
                .get(&url)
                .header(self.config.token_header.as_str(), token)
                .send()
                .await,
        )
        .await
    }

    /// POST under the retry policy.
    pub async fn post(
        &self,
        operation: &str,
        path: &str,
        body: &Value,
    ) -> AuthResult<Completed<Value>> {
        self.post_with(operation, path, body, Outcome::Success).await
    }

    /// POST under the retry policy, classifying the success payload with
    /// `extract`. A payload `extract` cannot use counts as a transport
    /// failure and is retried.
    pub async fn post_with<T>(
        &self,
        operation: &str,
        path: &str,
        body: &Value,
        extract: impl Fn(Value) -> Outcome<T>,
    ) -> AuthResult<Completed<T>> {
        let extract = &extract;
        self.policy
            .execute(operation, move |_| async move {
                self.post_once(path, body).await.and_then(extract)
            })
            .await
    }

    /// Token-authenticated GET under the retry policy.
    pub async fn get_with_token(
        &self,
        operation: &str,
        path: &str,
        token: &str,
    ) -> AuthResult<Completed<Value>> {
        self.policy
            .execute(operation, move |_| self.get_once(path, token))
            .await
    }
}

async fn classify(result: Result<reqwest::Response, reqwest::Error>) -> Outcome<Value> {
    let response = match result {
        Ok(response) => response,
        Err(e) => return Outcome::TransportFailure(e.to_string()),
    };
    let status = response.status();
    if status.is_server_error() {
        return Outcome::TransportFailure(format!("server error (HTTP {status})"));
    }
    match response.json::<ApiResponse>().await {
        Ok(body) => body.into_outcome(),
        Err(e) => Outcome::TransportFailure(format!("malformed response body (HTTP {status}): {e}")),
    }
}
