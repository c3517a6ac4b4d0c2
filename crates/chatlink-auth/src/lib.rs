//! # Chatlink Auth
//!
//! Produces the validated credential a chat session logs in with.
//!
//! ## Architecture
//!
//! - [`retry`] - one bounded-retry primitive shared by every backend call
//! - [`client`] - HTTP client classifying `{code, msg, data}` responses
//! - [`validator`] - token validation against the identity endpoint
//! - [`login`] - interactive email and phone (CAPTCHA + SMS) login
//! - [`device`] - stable device id and platform label
//! - [`credential`] - credential persistence
//! - [`bootstrap`] - load, validate, and if needed re-acquire at startup
//!
//! Transport failures (network errors, timeouts, malformed bodies) are
//! retried immediately up to [`ApiConfig::max_attempts`] times and then
//! surface as [`AuthError::RetryExhausted`]. Backend rejections are values,
//! never errors, and are not retried.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatlink_auth::{ApiClient, ApiConfig, AuthTokenValidator, Validation};
//!
//! # async fn run() -> chatlink_auth::AuthResult<()> {
//! let client = ApiClient::new(ApiConfig::new("https://chat.example.com"))?;
//! match AuthTokenValidator::new(client).validate("stored-token").await? {
//!     Validation::Valid(identity) => println!("hello {}", identity.display_name),
//!     Validation::Invalid(reason) => println!("log in again: {reason}"),
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bootstrap;
pub mod client;
pub mod config;
pub mod credential;
pub mod device;
pub mod error;
pub mod login;
pub mod retry;
pub mod validator;

pub use bootstrap::{CredentialBootstrap, SessionCredential};
pub use client::{ApiClient, ApiResponse, SUCCESS_CODE};
pub use config::{ApiConfig, DEFAULT_MAX_ATTEMPTS, EndpointPaths};
pub use credential::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredCredential,
};
pub use device::{DeviceIdentity, platform_label};
pub use error::{AuthError, AuthResult};
pub use login::{CaptchaSink, LoginCoordinator, LoginMode, Prompter};
pub use retry::{Completed, Outcome, RetryPolicy};
pub use validator::{AuthTokenValidator, Identity, Validation};

// Re-exported so collaborators implement `Prompter::secret` without a direct dependency
pub use secrecy::SecretString;
