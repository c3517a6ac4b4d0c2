//! Token validation against the identity endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::AuthResult;
use crate::retry::{Completed, Outcome};

/// Identity the backend associates with a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Backend user id
    pub user_id: String,
    /// Nickname, or the user id when the backend has none
    pub display_name: String,
    /// The token that was validated
    pub token: String,
}

/// Result of validating a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Token accepted
    Valid(Identity),
    /// Token refused by the backend, with its reason
    Invalid(String),
}

#[derive(Deserialize)]
struct IdentityData {
    user: UserRecord,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    user_id: Value,
    #[serde(default)]
    nickname: Option<String>,
}

/// Confirms a candidate token with the backend
#[derive(Debug, Clone)]
pub struct AuthTokenValidator {
    client: ApiClient,
}

impl AuthTokenValidator {
    /// Validator over `client`
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Look the token up.
    ///
    /// A declined lookup is [`Validation::Invalid`], never retried. Transport
    /// failures, including a success response without a usable user record,
    /// are retried and end in [`crate::AuthError::RetryExhausted`].
    pub async fn validate(&self, token: &str) -> AuthResult<Validation> {
        let client = &self.client;
        let path = client.config().endpoints.identity.as_str();

        let completed = client
            .policy()
            .execute("identity lookup", move |_| async move {
                client
                    .get_once(path, token)
                    .await
                    .and_then(|data| parse_identity(data, token))
            })
            .await?;

        Ok(match completed {
            Completed::Success(identity) => {
                info!("token accepted for user {}", identity.user_id);
                Validation::Valid(identity)
            }
            Completed::Rejected(reason) => {
                debug!("token refused: {}", reason);
                Validation::Invalid(reason)
            }
        })
    }
}

fn parse_identity(data: Value, token: &str) -> Outcome<Identity> {
    let record = match serde_json::from_value::<IdentityData>(data) {
        Ok(data) => data.user,
        Err(e) => return Outcome::TransportFailure(format!("malformed identity payload: {e}")),
    };
    let user_id = match record.user_id {
        Value::String(id) if !id.is_empty() => id,
        Value::Number(id) => id.to_string(),
        other => {
            return Outcome::TransportFailure(format!("unusable user id in identity payload: {other}"));
        }
    };
    Outcome::Success(Identity {
        display_name: record
            .nickname
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| user_id.clone()),
        user_id,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::error::AuthError;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn validator(server: &MockServer) -> AuthTokenValidator {
        let config = ApiConfig::new(server.uri()).with_request_timeout(Duration::from_millis(500));
        AuthTokenValidator::new(ApiClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_valid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/user/info"))
            .and(header("token", "T"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"code": 1, "data": {"user": {"userId": "u1", "nickname": "n1"}}}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let result = validator(&server).await.validate("T").await.unwrap();
        assert_eq!(
            result,
            Validation::Valid(Identity {
                user_id: "u1".to_string(),
                display_name: "n1".to_string(),
                token: "T".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_declined_token_is_invalid_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let result = validator(&server).await.validate("stale").await.unwrap();
        assert!(matches!(result, Validation::Invalid(_)));
    }

    #[tokio::test]
    async fn test_numeric_user_id_and_missing_nickname() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 1, "data": {"user": {"userId": 42}}})),
            )
            .mount(&server)
            .await;

        match validator(&server).await.validate("T").await.unwrap() {
            Validation::Valid(identity) => {
                assert_eq!(identity.user_id, "42");
                assert_eq!(identity.display_name, "42");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_without_user_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 1, "data": {}})))
            .expect(5)
            .mount(&server)
            .await;

        let err = validator(&server).await.validate("T").await.unwrap_err();
        assert!(matches!(err, AuthError::RetryExhausted { attempts: 5, .. }));
    }

    #[tokio::test]
    async fn test_gateway_error_is_not_a_declined_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({"error": "upstream unavailable"})),
            )
            .expect(5)
            .mount(&server)
            .await;

        let err = validator(&server).await.validate("T").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::RetryExhausted { ref operation, attempts: 5, .. } if operation == "identity lookup"
        ));
    }
}
