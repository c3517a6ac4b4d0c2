//! Error types for the chatlink binary

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI-level errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Credential acquisition failed
    #[error("Login failed: {0}")]
    Auth(#[from] chatlink_auth::AuthError),

    /// Realtime session error
    #[error("Session error: {0}")]
    Session(#[from] chatlink_websocket::SessionError),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration file does not exist
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(std::path::PathBuf),

    /// Configuration file has an unsupported extension
    #[error("Unsupported configuration file format: {0}. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat(String),

    /// Configuration loaded but holds an unusable value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Hints printed under the error message
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Auth(chatlink_auth::AuthError::RetryExhausted { .. }) => vec![
                "Check that the API base_url is reachable",
                "Raise api.request_timeout_ms on slow networks",
            ],
            Self::Auth(chatlink_auth::AuthError::Store(_)) => vec![
                "Delete the credential file to start from a fresh login",
            ],
            Self::Config(_)
            | Self::ConfigNotFound(_)
            | Self::UnsupportedFormat(_)
            | Self::InvalidConfig(_) => vec![
                "Check the file passed with --config",
                "Nested keys are overridden with CHATLINK_<SECTION>__<KEY>",
            ],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_exhausted_has_suggestions() {
        let err = CliError::from(chatlink_auth::AuthError::RetryExhausted {
            operation: "identity lookup".to_string(),
            attempts: 5,
            last_cause: "timed out".to_string(),
        });
        assert!(err.to_string().starts_with("Login failed: identity lookup"));
        assert_eq!(err.suggestions().len(), 2);
    }

    #[test]
    fn test_session_error_wraps() {
        let err = CliError::from(chatlink_websocket::SessionError::Destroyed);
        assert!(err.to_string().starts_with("Session error:"));
        assert!(err.suggestions().is_empty());
    }
}
