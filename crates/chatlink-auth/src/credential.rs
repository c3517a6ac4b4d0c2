//! Persisted credential storage.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::device::DeviceIdentity;
use crate::error::{AuthError, AuthResult};

/// What survives between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    /// Last token obtained by login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// User id the token belonged to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Device identity; kept when the token is cleared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceIdentity>,
    /// When the token was saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl StoredCredential {
    /// Drop the token and user id, keep the device identity
    pub fn without_token(&self) -> Self {
        Self {
            device: self.device.clone(),
            ..Self::default()
        }
    }
}

/// Credential persistence
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the stored credential; an empty store yields the default value
    async fn load(&self) -> AuthResult<StoredCredential>;

    /// Replace the stored credential
    async fn save(&self, credential: &StoredCredential) -> AuthResult<()>;

    /// Forget the token but keep the device identity
    async fn clear_credential(&self) -> AuthResult<()> {
        let current = self.load().await?;
        self.save(&current.without_token()).await
    }
}

/// JSON file store
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> AuthResult<StoredCredential> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                AuthError::store(format!("{} is not a credential file: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no credential file at {}", self.path.display());
                Ok(StoredCredential::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, credential: &StoredCredential) -> AuthResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, serde_json::to_vec_pretty(credential)?).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        info!("credential saved to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store that counts writes
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<StoredCredential>,
    writes: AtomicUsize,
}

impl MemoryCredentialStore {
    /// Store seeded with `credential`
    pub fn with_credential(credential: StoredCredential) -> Self {
        Self {
            inner: Mutex::new(credential),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `save` calls so far
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current contents
    pub async fn snapshot(&self) -> StoredCredential {
        self.inner.lock().await.clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> AuthResult<StoredCredential> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save(&self, credential: &StoredCredential) -> AuthResult<()> {
        *self.inner.lock().await = credential.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
