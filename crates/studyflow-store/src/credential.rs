//! Credential row type and expiry semantics.

use chrono::{DateTime, Utc};
use studyflow_core::Provider;

/// A stored set of provider tokens for one (user, provider) pair.
///
/// Created on the first successful code exchange, mutated in place on every
/// refresh, deleted on explicit disconnect. Deleting the row removes the
/// ability to fetch; it does not revoke consent at the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Owning principal, as issued by the external identity system.
    pub user_id: String,
    /// The provider these tokens belong to.
    pub provider: Provider,
    /// Short-lived bearer credential for provider API calls.
    pub access_token: String,
    /// Long-lived credential used to mint new access tokens. May be absent
    /// when the provider did not grant one.
    pub refresh_token: Option<String>,
    /// Absolute instant after which `access_token` must not be used.
    /// `None` means the token does not expire.
    pub token_expiry: Option<DateTime<Utc>>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Returns true if the access token is expired at `now`.
    ///
    /// The boundary is inclusive: an expiry exactly at `now` counts as
    /// expired, so the token is refreshed rather than sent to the provider.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.token_expiry {
            Some(expiry) => expiry <= now,
            None => false,
        }
    }

    /// Returns true if the access token is expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Tokens written to the store after a successful code exchange.
///
/// A write with `refresh_token: None` never clears a refresh token already
/// on the row; the store keeps the existing value.
#[derive(Debug, Clone)]
pub struct TokenWrite {
    /// New access token.
    pub access_token: String,
    /// New refresh token, if the provider issued one.
    pub refresh_token: Option<String>,
    /// Absolute expiry of the new access token.
    pub token_expiry: Option<DateTime<Utc>>,
}

impl TokenWrite {
    /// Builds a write from a token-endpoint response, converting the
    /// relative `expires_in` to an absolute instant.
    pub fn from_response(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            token_expiry: expires_in_secs.map(|secs| now + chrono::Duration::seconds(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn credential(expiry: Option<DateTime<Utc>>) -> Credential {
        Credential {
            user_id: "user-1".into(),
            provider: Provider::Gmail,
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
            token_expiry: expiry,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn future_expiry_is_valid() {
        let now = Utc::now();
        let cred = credential(Some(now + Duration::hours(1)));
        assert!(!cred.is_expired_at(now));
    }

    #[test]
    fn past_expiry_is_expired() {
        let now = Utc::now();
        let cred = credential(Some(now - Duration::hours(1)));
        assert!(cred.is_expired_at(now));
    }

    #[test]
    fn expiry_exactly_now_is_expired() {
        let now = Utc::now();
        let cred = credential(Some(now));
        assert!(cred.is_expired_at(now));
    }

    #[test]
    fn missing_expiry_never_expires() {
        let cred = credential(None);
        assert!(!cred.is_expired_at(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn token_write_computes_absolute_expiry() {
        let now = Utc::now();
        let write = TokenWrite::from_response("a", None, Some(3600), now);
        assert_eq!(write.token_expiry, Some(now + Duration::seconds(3600)));

        let write = TokenWrite::from_response("a", None, None, now);
        assert!(write.token_expiry.is_none());
    }
}
