//! Common test utilities for the login and bootstrap integration tests
//!
//! Provides a mock chat backend, a scripted operator and a recording
//! CAPTCHA sink.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chatlink_auth::{
    ApiClient, ApiConfig, AuthError, AuthResult, CaptchaSink, DeviceIdentity, LoginMode,
    Prompter, SecretString,
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

/// Mock backend with helpers for each endpoint
pub struct MockBackend {
    pub server: MockServer,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// API client pointed at the mock, writing CAPTCHA images to `captcha_path`
    pub fn client(&self, captcha_path: &Path) -> ApiClient {
        ApiClient::new(
            ApiConfig::new(self.server.uri())
                .with_request_timeout(Duration::from_millis(500))
                .with_captcha_path(captcha_path),
        )
        .unwrap()
    }

    /// POST `endpoint` with exactly `body` answers `response`, `times` times
    pub async fn expect_post(&self, endpoint: &str, body: Value, response: Value, times: u64) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(body_json(body))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Identity lookup for `token` answers with the given user
    pub async fn identity_ok(&self, token: &str, user_id: &str, nickname: &str) {
        Mock::given(method("GET"))
            .and(path("/api/v1/user/info"))
            .and(header("token", token))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 1,
                "data": {"user": {"userId": user_id, "nickname": nickname}}
            })))
            .mount(&self.server)
            .await;
    }

    /// Identity lookup for `token` is declined, exactly `times` times
    pub async fn identity_declined(&self, token: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path("/api/v1/user/info"))
            .and(header("token", token))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
            .expect(times)
            .mount(&self.server)
            .await;
    }
}

pub fn device() -> DeviceIdentity {
    DeviceIdentity::new("d1", "p1")
}

/// Operator replaying a fixed script.
///
/// Once the script runs out every prompt fails, which ends the login loop.
#[derive(Default)]
pub struct ScriptedPrompter {
    modes: Mutex<VecDeque<LoginMode>>,
    answers: Mutex<VecDeque<String>>,
    labels: Mutex<Vec<String>>,
    mode_prompts: AtomicUsize,
}

impl ScriptedPrompter {
    pub fn new(modes: &[LoginMode], answers: &[&str]) -> Self {
        Self {
            modes: Mutex::new(modes.iter().copied().collect()),
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            ..Self::default()
        }
    }

    /// How many times mode selection was shown
    pub fn mode_prompts(&self) -> usize {
        self.mode_prompts.load(Ordering::SeqCst)
    }

    /// Labels of every input and secret prompt, in order
    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }

    fn next_answer(&self, label: &str) -> AuthResult<String> {
        self.labels.lock().unwrap().push(label.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AuthError::prompt(format!("no scripted answer for {label}")))
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn select_mode(&self) -> AuthResult<LoginMode> {
        self.mode_prompts.fetch_add(1, Ordering::SeqCst);
        self.modes
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AuthError::prompt("script exhausted"))
    }

    async fn input(&self, label: &str) -> AuthResult<String> {
        self.next_answer(label)
    }

    async fn secret(&self, label: &str) -> AuthResult<SecretString> {
        self.next_answer(label).map(SecretString::new)
    }
}

/// CAPTCHA sink recording its lifecycle
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<String>>,
    published: Mutex<Vec<PathBuf>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<PathBuf> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaptchaSink for RecordingSink {
    async fn start(&self) -> AuthResult<()> {
        self.events.lock().unwrap().push("start".to_string());
        Ok(())
    }

    async fn publish(&self, image: &Path) -> AuthResult<()> {
        self.events.lock().unwrap().push("publish".to_string());
        self.published.lock().unwrap().push(image.to_path_buf());
        Ok(())
    }

    async fn stop(&self) {
        self.events.lock().unwrap().push("stop".to_string());
    }
}
