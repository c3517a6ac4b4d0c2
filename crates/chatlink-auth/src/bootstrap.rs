//! Startup credential acquisition.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::credential::{CredentialStore, StoredCredential};
use crate::device::DeviceIdentity;
use crate::error::AuthResult;
use crate::login::{CaptchaSink, LoginCoordinator, Prompter};
use crate::validator::{AuthTokenValidator, Identity, Validation};

/// Everything a session needs to log in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredential {
    /// Validated identity, including the token
    pub identity: Identity,
    /// Device the token was issued to
    pub device: DeviceIdentity,
}

/// Produces a validated credential at startup.
///
/// A stored token is validated first. When the backend refuses it the
/// stored token is cleared and the interactive login runs; its result is
/// persisted. A valid stored token is used as is, without writing storage.
pub struct CredentialBootstrap {
    client: ApiClient,
    store: Arc<dyn CredentialStore>,
    prompter: Arc<dyn Prompter>,
    sink: Arc<dyn CaptchaSink>,
}

impl std::fmt::Debug for CredentialBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialBootstrap")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl CredentialBootstrap {
    /// Bootstrap over the given collaborators
    pub fn new(
        client: ApiClient,
        store: Arc<dyn CredentialStore>,
        prompter: Arc<dyn Prompter>,
        sink: Arc<dyn CaptchaSink>,
    ) -> Self {
        Self {
            client,
            store,
            prompter,
            sink,
        }
    }

    /// Load, validate, and if needed replace the stored credential.
    ///
    /// # Errors
    ///
    /// [`crate::AuthError::RetryExhausted`] when the identity lookup or a login
    /// call keeps failing; storage and prompt errors.
    pub async fn obtain(&self) -> AuthResult<SessionCredential> {
        let mut stored = self.store.load().await?;

        let device = match stored.device.clone() {
            Some(device) => device,
            None => {
                let device = DeviceIdentity::detect();
                stored.device = Some(device.clone());
                self.store.save(&stored).await?;
                device
            }
        };

        if let Some(token) = stored.token.as_deref() {
            let validator = AuthTokenValidator::new(self.client.clone());
            match validator.validate(token).await? {
                Validation::Valid(identity) => {
                    info!("stored credential is valid for {}", identity.user_id);
                    return Ok(SessionCredential { identity, device });
                }
                Validation::Invalid(reason) => {
                    warn!("stored credential rejected ({}), clearing it", reason);
                    self.store.clear_credential().await?;
                }
            }
        }

        let coordinator = LoginCoordinator::new(
            self.client.clone(),
            device.clone(),
            Arc::clone(&self.prompter),
            Arc::clone(&self.sink),
        );
        let identity = coordinator.login().await?;

        self.store
            .save(&StoredCredential {
                token: Some(identity.token.clone()),
                user_id: Some(identity.user_id.clone()),
                device: Some(device.clone()),
                saved_at: Some(Utc::now()),
            })
            .await?;

        Ok(SessionCredential { identity, device })
    }
}
