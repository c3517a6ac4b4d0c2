//! Bounded retry shared by every backend call.
//!
//! One attempt is classified as an [`Outcome`]. [`RetryPolicy::execute`]
//! repeats the attempt while it reports a transport failure, immediately and
//! without backoff, and escalates to [`AuthError::RetryExhausted`] once the
//! budget is spent. Success and application rejection end the loop at once
//! and do not consume a retry.

use std::future::Future;

use tracing::{debug, warn};

use crate::config::DEFAULT_MAX_ATTEMPTS;
use crate::error::{AuthError, AuthResult};

/// Classification of a single request attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Backend answered with the success sentinel
    Success(T),
    /// Backend answered but declined, with its message
    Rejected(String),
    /// Network error, timeout or malformed body
    TransportFailure(String),
}

impl<T> Outcome<T> {
    /// Map the success payload
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Rejected(msg) => Outcome::Rejected(msg),
            Outcome::TransportFailure(cause) => Outcome::TransportFailure(cause),
        }
    }

    /// Chain a classification of the success payload
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Success(value) => f(value),
            Outcome::Rejected(msg) => Outcome::Rejected(msg),
            Outcome::TransportFailure(cause) => Outcome::TransportFailure(cause),
        }
    }
}

/// Terminal result of a retried request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completed<T> {
    /// Backend accepted the request
    Success(T),
    /// Backend declined the request; never retried
    Rejected(String),
}

/// Attempt budget for one logical request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive transport failures tolerated, including the last one
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempt budget (at least one)
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Run `attempt` until it succeeds, is rejected, or fails
    /// `max_attempts` times in a row at the transport level.
    ///
    /// The closure receives the 1-based attempt number.
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut attempt: F) -> AuthResult<Completed<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let mut failures = 0u32;
        loop {
            match attempt(failures + 1).await {
                Outcome::Success(value) => {
                    if failures > 0 {
                        debug!("{} succeeded after {} failed attempts", operation, failures);
                    }
                    return Ok(Completed::Success(value));
                }
                Outcome::Rejected(msg) => {
                    debug!("{} rejected by backend: {}", operation, msg);
                    return Ok(Completed::Rejected(msg));
                }
                Outcome::TransportFailure(cause) => {
                    failures += 1;
                    if failures >= self.max_attempts {
                        return Err(AuthError::RetryExhausted {
                            operation: operation.to_string(),
                            attempts: failures,
                            last_cause: cause,
                        });
                    }
                    warn!(
                        "{} attempt {}/{} failed, retrying: {}",
                        operation, failures, self.max_attempts, cause
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_four_failures_then_success() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::default()
            .execute("op", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 5 {
                        Outcome::TransportFailure("timeout".to_string())
                    } else {
                        Outcome::Success(attempt)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result, Completed::Success(5));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_fifth_failure_exhausts() {
        let calls = AtomicU32::new(0);
        let err = RetryPolicy::default()
            .execute::<(), _, _>("identity lookup", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Outcome::TransportFailure(format!("refused #{attempt}")) }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        match err {
            AuthError::RetryExhausted {
                operation,
                attempts,
                last_cause,
            } => {
                assert_eq!(operation, "identity lookup");
                assert_eq!(attempts, 5);
                assert_eq!(last_cause, "refused #5");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::default()
            .execute::<(), _, _>("email login", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Outcome::Rejected("bad password".to_string()) }
            })
            .await
            .unwrap();

        assert_eq!(result, Completed::Rejected("bad password".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejection_after_failures_stops() {
        let result = RetryPolicy::new(3)
            .execute::<(), _, _>("op", |attempt| async move {
                if attempt < 3 {
                    Outcome::TransportFailure("reset".to_string())
                } else {
                    Outcome::Rejected("nope".to_string())
                }
            })
            .await
            .unwrap();
        assert_eq!(result, Completed::Rejected("nope".to_string()));
    }

    #[test]
    fn test_outcome_map() {
        assert_eq!(Outcome::Success(2).map(|v| v * 2), Outcome::Success(4));
        assert_eq!(
            Outcome::<u8>::Rejected("x".into()).map(|v| v * 2),
            Outcome::Rejected("x".into())
        );
    }
}
