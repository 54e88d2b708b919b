//! Credential shared between clients

use std::sync::Arc;

use digirest_domain::Credential;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe handle to a [`Credential`].
///
/// Cloning is cheap and clones share state. Token refreshes hold the write
/// lock, so refreshes of one credential are serialized; refreshes started
/// from different clients still race and the last writer wins.
#[derive(Debug, Clone, Default)]
pub struct SharedCredential(Arc<RwLock<Credential>>);

impl SharedCredential {
    pub fn new(credential: Credential) -> Self {
        Self(Arc::new(RwLock::new(credential)))
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> Credential {
        self.0.read().await.clone()
    }

    /// Current access token, if any
    pub async fn access_token(&self) -> Option<String> {
        self.0.read().await.token().map(str::to_string)
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, Credential> {
        self.0.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Credential> {
        self.0.write().await
    }
}

impl From<Credential> for SharedCredential {
    fn from(credential: Credential) -> Self {
        Self::new(credential)
    }
}
