//! Error types for credential acquisition.
//!
//! Application-level rejections and invalid credentials are ordinary values
//! ([`crate::Outcome::Rejected`], [`crate::Validation::Invalid`]), not errors.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Error type for auth operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// The same logical request failed at the transport level on every attempt
    #[error("{operation} failed after {attempts} attempts: {last_cause}")]
    RetryExhausted {
        /// Logical operation name
        operation: String,
        /// Attempts made
        attempts: u32,
        /// Cause of the final failure
        last_cause: String,
    },

    /// CAPTCHA image could not be decoded, stored or published
    #[error("CAPTCHA delivery failed: {0}")]
    Captcha(String),

    /// Operator input could not be read
    #[error("Prompt failed: {0}")]
    Prompt(String),

    /// Credential store could not be read or written
    #[error("Credential store error: {0}")]
    Store(String),

    /// HTTP client could not be built
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Create a CAPTCHA delivery error
    #[must_use]
    pub fn captcha(msg: impl Into<String>) -> Self {
        Self::Captcha(msg.into())
    }

    /// Create a prompt error
    #[must_use]
    pub fn prompt(msg: impl Into<String>) -> Self {
        Self::Prompt(msg.into())
    }

    /// Create a credential store error
    #[must_use]
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Whether the login loop may return to mode selection after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Captcha(_))
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
