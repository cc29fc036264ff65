//! In-memory store for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use studyflow_core::Provider;

use crate::credential::{Credential, TokenWrite};
use crate::error::StoreResult;
use crate::state::AuthState;
use crate::store::{CredentialStore, StateStore};

/// HashMap-backed store with the same conflict semantics as
/// [`SqliteStore`](crate::SqliteStore).
#[derive(Debug, Default)]
pub struct MemoryStore {
    credentials: Mutex<HashMap<(String, Provider), Credential>>,
    states: Mutex<HashMap<String, AuthState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, user_id: &str, provider: Provider) -> StoreResult<Option<Credential>> {
        let credentials = self.credentials.lock().unwrap();
        Ok(credentials.get(&(user_id.to_string(), provider)).cloned())
    }

    fn upsert(&self, user_id: &str, provider: Provider, tokens: &TokenWrite) -> StoreResult<()> {
        let mut credentials = self.credentials.lock().unwrap();
        let key = (user_id.to_string(), provider);
        let existing_refresh = credentials
            .get(&key)
            .and_then(|c| c.refresh_token.clone());
        credentials.insert(
            key,
            Credential {
                user_id: user_id.to_string(),
                provider,
                access_token: tokens.access_token.clone(),
                refresh_token: tokens.refresh_token.clone().or(existing_refresh),
                token_expiry: tokens.token_expiry,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    fn update_access_token(
        &self,
        user_id: &str,
        provider: Provider,
        access_token: &str,
        token_expiry: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let mut credentials = self.credentials.lock().unwrap();
        if let Some(cred) = credentials.get_mut(&(user_id.to_string(), provider)) {
            cred.access_token = access_token.to_string();
            cred.token_expiry = token_expiry;
            cred.updated_at = Utc::now();
        }
        Ok(())
    }

    fn delete(&self, user_id: &str, provider: Provider) -> StoreResult<bool> {
        let mut credentials = self.credentials.lock().unwrap();
        Ok(credentials.remove(&(user_id.to_string(), provider)).is_some())
    }
}

impl StateStore for MemoryStore {
    fn insert_state(&self, state: &AuthState) -> StoreResult<()> {
        let mut states = self.states.lock().unwrap();
        states.insert(state.nonce.clone(), state.clone());
        Ok(())
    }

    fn take_state(&self, nonce: &str) -> StoreResult<Option<AuthState>> {
        let mut states = self.states.lock().unwrap();
        Ok(states.remove(nonce))
    }

    fn purge_expired_states(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut states = self.states.lock().unwrap();
        let before = states.len();
        states.retain(|_, state| !state.is_expired_at(now));
        Ok(before - states.len())
    }
}
