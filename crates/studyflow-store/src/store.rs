//! Storage traits shared by the SQLite and in-memory backends.

use chrono::{DateTime, Utc};
use studyflow_core::Provider;

use crate::credential::{Credential, TokenWrite};
use crate::error::StoreResult;
use crate::state::AuthState;

/// Persistence for provider credentials.
///
/// The invariant all implementations uphold: at most one row per
/// (user, provider), and an upsert whose `refresh_token` is `None` never
/// clears a previously stored refresh token.
pub trait CredentialStore: Send + Sync {
    /// Loads the credential for (user, provider), if connected.
    fn get(&self, user_id: &str, provider: Provider) -> StoreResult<Option<Credential>>;

    /// Inserts or replaces the credential for (user, provider).
    fn upsert(&self, user_id: &str, provider: Provider, tokens: &TokenWrite) -> StoreResult<()>;

    /// Overwrites the access token and expiry after a refresh, leaving the
    /// refresh token untouched.
    fn update_access_token(
        &self,
        user_id: &str,
        provider: Provider,
        access_token: &str,
        token_expiry: Option<DateTime<Utc>>,
    ) -> StoreResult<()>;

    /// Deletes the credential on disconnect. Returns whether a row existed.
    fn delete(&self, user_id: &str, provider: Provider) -> StoreResult<bool>;
}

/// Persistence for pending authorization states.
pub trait StateStore: Send + Sync {
    /// Records a freshly issued state nonce.
    fn insert_state(&self, state: &AuthState) -> StoreResult<()>;

    /// Consumes a state nonce: returns the row if it exists and deletes it
    /// so the nonce cannot be replayed. Expiry is the caller's check.
    fn take_state(&self, nonce: &str) -> StoreResult<Option<AuthState>>;

    /// Removes states that expired before `now`. Best-effort housekeeping.
    fn purge_expired_states(&self, now: DateTime<Utc>) -> StoreResult<usize>;
}
