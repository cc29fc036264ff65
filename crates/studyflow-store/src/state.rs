//! Single-use authorization state rows.

use chrono::{DateTime, Utc};
use studyflow_core::Provider;

/// Lifetime of a pending authorization state.
pub const STATE_TTL_MINUTES: i64 = 10;

/// A pending consent flow, keyed by the `state` nonce round-tripped through
/// the provider.
///
/// The nonce binds the callback to the user who initiated the flow: the
/// callback handler consumes the row (single use) and attributes the code
/// exchange to `user_id`. An unknown, reused, or expired nonce terminates
/// the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    /// Random url-safe nonce issued by the start endpoint.
    pub nonce: String,
    /// Provider the consent flow was started for.
    pub provider: Provider,
    /// User who initiated the flow.
    pub user_id: String,
    /// Instant after which the nonce is no longer accepted.
    pub expires_at: DateTime<Utc>,
}

impl AuthState {
    /// Creates a state for a flow starting at `now` with the default TTL.
    pub fn issue(
        nonce: impl Into<String>,
        provider: Provider,
        user_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            nonce: nonce.into(),
            provider,
            user_id: user_id.into(),
            expires_at: now + chrono::Duration::minutes(STATE_TTL_MINUTES),
        }
    }

    /// Returns true if the nonce has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn issued_state_expires_after_ttl() {
        let now = Utc::now();
        let state = AuthState::issue("nonce", Provider::Gmail, "user-1", now);
        assert!(!state.is_expired_at(now));
        assert!(!state.is_expired_at(now + Duration::minutes(STATE_TTL_MINUTES - 1)));
        assert!(state.is_expired_at(now + Duration::minutes(STATE_TTL_MINUTES)));
    }
}
