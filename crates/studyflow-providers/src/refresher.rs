//! Token refresh state machine.
//!
//! Given a stored credential, decides whether the access token is usable
//! and refreshes it when it is not:
//!
//! - no credential → the account was never connected (or disconnected);
//!   reauthorization required
//! - expiry missing or in the future → token returned unchanged
//! - expired (inclusive of "exactly now") → refresh token exchanged for a
//!   new access token, which overwrites the stored one
//! - refresh token missing or rejected → reauthorization required, stored
//!   credential left untouched so an explicit disconnect stays the user's
//!   decision
//!
//! Refreshes for the same (user, provider) are serialized through a keyed
//! mutex: a second request arriving mid-refresh waits, re-reads the store,
//! and finds a fresh token instead of issuing a redundant provider call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use studyflow_core::Provider;
use studyflow_store::CredentialStore;

use crate::error::{ProviderError, ProviderResult};
use crate::oauth::OAuthClient;

/// Serializes token refreshes per (user, provider) and keeps the store
/// up to date.
pub struct TokenRefresher {
    store: Arc<dyn CredentialStore>,
    oauth: Arc<OAuthClient>,
    locks: Mutex<HashMap<(String, Provider), Arc<AsyncMutex<()>>>>,
}

impl TokenRefresher {
    /// Creates a refresher over the given store and OAuth client.
    pub fn new(store: Arc<dyn CredentialStore>, oauth: Arc<OAuthClient>) -> Self {
        Self {
            store,
            oauth,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a usable access token for (user, provider), refreshing if
    /// the stored one has expired.
    pub async fn access_token(&self, user_id: &str, provider: Provider) -> ProviderResult<String> {
        let credential = self
            .store
            .get(user_id, provider)?
            .ok_or_else(|| not_connected(provider))?;

        if !credential.is_expired() {
            return Ok(credential.access_token);
        }

        let lock = self.lock_for(user_id, provider);
        let _guard = lock.lock().await;

        // Re-read after acquiring the lock: a concurrent request may have
        // refreshed while we waited.
        let credential = self
            .store
            .get(user_id, provider)?
            .ok_or_else(|| not_connected(provider))?;
        if !credential.is_expired() {
            debug!(user_id, provider = %provider, "token refreshed by concurrent request");
            return Ok(credential.access_token);
        }

        let Some(refresh_token) = credential.refresh_token.as_deref() else {
            warn!(user_id, provider = %provider, "expired token without refresh token");
            return Err(ProviderError::reauthorization_required(format!(
                "no refresh token available; reconnect your {} account",
                provider.display_name()
            ))
            .with_provider(provider));
        };

        let refreshed = self
            .oauth
            .refresh(refresh_token)
            .await
            .map_err(|e| e.with_provider(provider))?;

        let expiry = refreshed
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        self.store
            .update_access_token(user_id, provider, &refreshed.access_token, expiry)?;

        info!(user_id, provider = %provider, "access token refreshed");
        Ok(refreshed.access_token)
    }

    fn lock_for(&self, user_id: &str, provider: Provider) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("refresh lock map poisoned");
        locks
            .entry((user_id.to_string(), provider))
            .or_default()
            .clone()
    }
}

fn not_connected(provider: Provider) -> ProviderError {
    ProviderError::reauthorization_required(format!(
        "{} not connected; connect your {} account first",
        provider.display_name(),
        provider.display_name()
    ))
    .with_provider(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OAuthConfig;
    use crate::error::ErrorCode;
    use studyflow_store::{MemoryStore, TokenWrite};

    fn refresher(store: Arc<MemoryStore>) -> TokenRefresher {
        let config = OAuthConfig::new("id", "secret", "https://app.test/callback");
        let oauth = Arc::new(OAuthClient::new(config).unwrap());
        TokenRefresher::new(store, oauth)
    }

    #[tokio::test]
    async fn missing_credential_requires_reauthorization() {
        let store = Arc::new(MemoryStore::new());
        let err = refresher(store)
            .access_token("user-1", Provider::Gmail)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ReauthorizationRequired);
        assert!(err.message().contains("not connected"));
    }

    #[tokio::test]
    async fn valid_token_returned_unchanged() {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert(
                "user-1",
                Provider::Gmail,
                &TokenWrite {
                    access_token: "still-good".into(),
                    refresh_token: Some("r".into()),
                    token_expiry: Some(Utc::now() + chrono::Duration::hours(1)),
                },
            )
            .unwrap();

        let token = refresher(store)
            .access_token("user-1", Provider::Gmail)
            .await
            .unwrap();
        assert_eq!(token, "still-good");
    }

    #[tokio::test]
    async fn token_without_expiry_is_treated_as_valid() {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert(
                "user-1",
                Provider::Classroom,
                &TokenWrite {
                    access_token: "no-expiry".into(),
                    refresh_token: None,
                    token_expiry: None,
                },
            )
            .unwrap();

        let token = refresher(store)
            .access_token("user-1", Provider::Classroom)
            .await
            .unwrap();
        assert_eq!(token, "no-expiry");
    }

    #[tokio::test]
    async fn expired_without_refresh_token_requires_reauthorization() {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert(
                "user-1",
                Provider::Gmail,
                &TokenWrite {
                    access_token: "expired".into(),
                    refresh_token: None,
                    token_expiry: Some(Utc::now() - chrono::Duration::hours(1)),
                },
            )
            .unwrap();

        let err = refresher(store.clone())
            .access_token("user-1", Provider::Gmail)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ReauthorizationRequired);

        // The stored credential is left as-is for an explicit disconnect.
        let cred = store.get("user-1", Provider::Gmail).unwrap().unwrap();
        assert_eq!(cred.access_token, "expired");
    }
}
