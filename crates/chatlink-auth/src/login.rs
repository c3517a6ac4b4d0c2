//! Interactive login.
//!
//! [`LoginCoordinator::login`] loops over mode selection until one flow
//! yields a validated identity. Backend rejections, refused tokens and
//! CAPTCHA delivery problems send the operator back to mode selection;
//! exhausted retries and unreadable input end the loop with an error.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::device::DeviceIdentity;
use crate::error::{AuthError, AuthResult};
use crate::retry::{Completed, Outcome};
use crate::validator::{AuthTokenValidator, Identity, Validation};

/// Login modes offered at mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    /// Email and password
    Email,
    /// Phone number, CAPTCHA and SMS code
    Phone,
}

impl LoginMode {
    /// Every mode, in presentation order
    pub const ALL: [LoginMode; 2] = [LoginMode::Email, LoginMode::Phone];
}

impl fmt::Display for LoginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginMode::Email => f.write_str("email"),
            LoginMode::Phone => f.write_str("phone"),
        }
    }
}

/// Operator input
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Pick one of [`LoginMode::ALL`]
    async fn select_mode(&self) -> AuthResult<LoginMode>;

    /// Read a visible line
    async fn input(&self, label: &str) -> AuthResult<String>;

    /// Read a line that must not be echoed or logged
    async fn secret(&self, label: &str) -> AuthResult<SecretString>;
}

/// Shows the current CAPTCHA image to the operator
#[async_trait]
pub trait CaptchaSink: Send + Sync {
    /// Begin serving
    async fn start(&self) -> AuthResult<()>;

    /// Serve the image now stored at `image`
    async fn publish(&self, image: &Path) -> AuthResult<()>;

    /// Stop serving
    async fn stop(&self);
}

/// How a single flow ended short of an error
#[derive(Debug, Clone, PartialEq, Eq)]
enum FlowEnd {
    Authenticated(Identity),
    Abandoned(String),
}

#[derive(Debug)]
struct CaptchaChallenge {
    id: String,
    image: String,
}

/// Drives the email and phone login flows
pub struct LoginCoordinator {
    client: ApiClient,
    validator: AuthTokenValidator,
    device: DeviceIdentity,
    prompter: Arc<dyn Prompter>,
    sink: Arc<dyn CaptchaSink>,
}

impl fmt::Debug for LoginCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCoordinator")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl LoginCoordinator {
    /// Coordinator for this device
    pub fn new(
        client: ApiClient,
        device: DeviceIdentity,
        prompter: Arc<dyn Prompter>,
        sink: Arc<dyn CaptchaSink>,
    ) -> Self {
        Self {
            validator: AuthTokenValidator::new(client.clone()),
            client,
            device,
            prompter,
            sink,
        }
    }

    /// Loop until a flow produces a validated identity.
    ///
    /// # Errors
    ///
    /// [`AuthError::RetryExhausted`] when a backend call keeps failing,
    /// [`AuthError::Prompt`] when operator input is unavailable.
    pub async fn login(&self) -> AuthResult<Identity> {
        loop {
            let mode = self.prompter.select_mode().await?;
            info!("starting {} login", mode);

            let result = match mode {
                LoginMode::Email => self.email_flow().await,
                LoginMode::Phone => self.phone_flow().await,
            };

            match result {
                Ok(FlowEnd::Authenticated(identity)) => {
                    info!("logged in as {}", identity.display_name);
                    return Ok(identity);
                }
                Ok(FlowEnd::Abandoned(reason)) => {
                    warn!("{} login abandoned: {}", mode, reason);
                }
                Err(e) if e.is_recoverable() => {
                    warn!("{} login failed: {}", mode, e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn email_flow(&self) -> AuthResult<FlowEnd> {
        let email = self.prompter.input("Email").await?;
        let password = self.prompter.secret("Password").await?;

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
            "deviceId": self.device.device_id,
            "platform": self.device.platform,
        });
        let endpoints = &self.client.config().endpoints;

        match self
            .client
            .post_with("email login", &endpoints.email_login, &body, extract_token)
            .await?
        {
            Completed::Success(token) => self.finish(&token).await,
            Completed::Rejected(reason) => Ok(FlowEnd::Abandoned(reason)),
        }
    }

    async fn phone_flow(&self) -> AuthResult<FlowEnd> {
        self.sink.start().await?;
        let result = self.phone_steps().await;
        self.sink.stop().await;
        result
    }

    async fn phone_steps(&self) -> AuthResult<FlowEnd> {
        let phone = self.prompter.input("Phone number").await?;
        let endpoints = &self.client.config().endpoints;

        let challenge = match self
            .client
            .post_with(
                "captcha request",
                &endpoints.captcha,
                &json!({
                    "phone": phone,
                    "deviceId": self.device.device_id,
                    "platform": self.device.platform,
                }),
                extract_captcha,
            )
            .await?
        {
            Completed::Success(challenge) => challenge,
            Completed::Rejected(reason) => return Ok(FlowEnd::Abandoned(reason)),
        };
        self.deliver_captcha(&challenge).await?;

        let solution = self.prompter.input("CAPTCHA").await?;
        let sms_body = json!({
            "phone": phone,
            "captcha": solution,
            "captchaId": challenge.id,
            "platform": self.device.platform,
        });
        if let Completed::Rejected(reason) = self
            .client
            .post("sms code request", &endpoints.sms_code, &sms_body)
            .await?
        {
            return Ok(FlowEnd::Abandoned(reason));
        }

        let code = self.prompter.input("SMS code").await?;
        let verify_body = json!({
            "phone": phone,
            "code": code,
            "deviceId": self.device.device_id,
            "platform": self.device.platform,
        });
        match self
            .client
            .post_with(
                "verification login",
                &endpoints.verify_login,
                &verify_body,
                extract_token,
            )
            .await?
        {
            Completed::Success(token) => self.finish(&token).await,
            Completed::Rejected(reason) => Ok(FlowEnd::Abandoned(reason)),
        }
    }

    async fn deliver_captcha(&self, challenge: &CaptchaChallenge) -> AuthResult<()> {
        let encoded = challenge
            .image
            .split_once("base64,")
            .map_or(challenge.image.as_str(), |(_, data)| data)
            .trim();
        let image = STANDARD
            .decode(encoded)
            .map_err(|e| AuthError::captcha(format!("image is not base64: {e}")))?;

        let path = &self.client.config().captcha_path;
        tokio::fs::write(path, &image)
            .await
            .map_err(|e| AuthError::captcha(format!("cannot write {}: {e}", path.display())))?;
        self.sink.publish(path).await
    }

    async fn finish(&self, token: &str) -> AuthResult<FlowEnd> {
        Ok(match self.validator.validate(token).await? {
            Validation::Valid(identity) => FlowEnd::Authenticated(identity),
            Validation::Invalid(reason) => {
                FlowEnd::Abandoned(format!("issued token was refused: {reason}"))
            }
        })
    }
}

fn extract_token(data: Value) -> Outcome<String> {
    match data.get("token").and_then(Value::as_str) {
        Some(token) if !token.is_empty() => Outcome::Success(token.to_string()),
        _ => Outcome::TransportFailure("login response carries no token".to_string()),
    }
}

fn extract_captcha(data: Value) -> Outcome<CaptchaChallenge> {
    let id = data.get("captchaId").and_then(Value::as_str);
    let image = data.get("image").and_then(Value::as_str);
    match (id, image) {
        (Some(id), Some(image)) => Outcome::Success(CaptchaChallenge {
            id: id.to_string(),
            image: image.to_string(),
        }),
        _ => Outcome::TransportFailure("captcha response is missing captchaId or image".to_string()),
    }
}
