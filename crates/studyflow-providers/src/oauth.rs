//! OAuth 2.0 authorization-code flow against Google's endpoints.
//!
//! This is the confidential-client variant of the flow: the server holds
//! the client secret, builds the consent URL, exchanges the redirect's
//! authorization code for tokens, and later exchanges the refresh token
//! for new access tokens. Consent is always requested with
//! `access_type=offline` and `prompt=consent` so every authorization
//! yields a refresh token, trading user friction for refresh reliability.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::Rng as _;
use tracing::{debug, info};

use studyflow_core::Provider;

use crate::config::OAuthConfig;
use crate::error::{transport_error, ProviderError, ProviderResult};

/// Length of the state nonce in bytes, before base64 encoding.
const STATE_NONCE_LENGTH: usize = 16;

/// Tokens obtained from a successful code exchange.
#[derive(Debug, Clone)]
pub struct TokenSet {
    /// Short-lived access token.
    pub access_token: String,
    /// Refresh token; absent when the provider did not grant one.
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds, when reported.
    pub expires_in: Option<i64>,
}

impl TokenSet {
    /// Converts the relative lifetime to an absolute expiry from `now`.
    pub fn expiry_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in
            .map(|secs| now + chrono::Duration::seconds(secs))
    }
}

/// A new access token minted from a refresh token.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    /// The new access token.
    pub access_token: String,
    /// Token lifetime in seconds, when reported.
    pub expires_in: Option<i64>,
}

/// OAuth client for Google APIs.
///
/// Stateless: every call is request-in/response-out; durable token state
/// lives in the credential store, not here.
#[derive(Debug)]
pub struct OAuthClient {
    config: OAuthConfig,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client from a validated configuration.
    pub fn new(config: OAuthConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ProviderError::configuration("failed to create HTTP client").with_source(e)
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Builds the authorization URL for a provider's consent flow.
    ///
    /// Scope and redirect URI are byte-identical across calls for the same
    /// provider; only `state` varies per call.
    pub fn authorize_url(&self, provider: Provider, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            access_type=offline&prompt=consent&state={}",
            self.config.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&provider.scope_param()),
            urlencoding::encode(state),
        )
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// Codes are single use: a failure here means the whole flow must be
    /// restarted, so it maps to [`ErrorCode::ExchangeFailed`].
    ///
    /// [`ErrorCode::ExchangeFailed`]: crate::error::ErrorCode::ExchangeFailed
    pub async fn exchange_code(&self, code: &str) -> ProviderResult<TokenSet> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| transport_error("token exchange request", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error("token exchange response", e))?;

        if !status.is_success() {
            return Err(ProviderError::exchange(format!(
                "token exchange failed ({}): {}",
                status, body
            ))
            .with_status(status.as_u16()));
        }

        let token_response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid token response: {}", e))
        })?;

        info!(
            has_refresh_token = token_response.refresh_token.is_some(),
            "authorization code exchanged"
        );
        Ok(TokenSet {
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token,
            expires_in: token_response.expires_in,
        })
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// Google normally does not reissue the refresh token here; the caller
    /// must preserve the stored one. A client-error rejection means the
    /// refresh token is invalid or revoked, which only a new consent flow
    /// can fix.
    pub async fn refresh(&self, refresh_token: &str) -> ProviderResult<RefreshedToken> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| transport_error("token refresh request", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error("token refresh response", e))?;

        if status.is_client_error() {
            return Err(ProviderError::reauthorization_required(format!(
                "token refresh rejected ({}): reconnect the account",
                status
            ))
            .with_status(status.as_u16()));
        }
        if !status.is_success() {
            return Err(ProviderError::fetch(format!(
                "token refresh failed ({}): {}",
                status, body
            ))
            .with_status(status.as_u16()));
        }

        let token_response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid refresh response: {}", e))
        })?;

        debug!("access token refreshed");
        Ok(RefreshedToken {
            access_token: token_response.access_token,
            expires_in: token_response.expires_in,
        })
    }
}

/// Generates a random url-safe state nonce.
pub fn generate_state() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..STATE_NONCE_LENGTH).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Response from Google's token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client() -> OAuthClient {
        let config = OAuthConfig::new("client-id", "client-secret", "https://app.test/callback")
            .with_timeout(Duration::from_secs(5));
        OAuthClient::new(config).unwrap()
    }

    #[test]
    fn rejects_unconfigured_client() {
        let config = OAuthConfig::new("", "", "https://app.test/callback");
        let err = OAuthClient::new(config).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ConfigurationError);
    }

    #[test]
    fn authorize_url_format() {
        let client = client();
        let url = client.authorize_url(Provider::Gmail, "nonce-1");

        assert!(url.starts_with(crate::config::GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("state=nonce-1"));
        assert!(url.contains(&urlencoding::encode(
            "https://www.googleapis.com/auth/gmail.readonly"
        ).into_owned()));
    }

    #[test]
    fn authorize_url_stable_apart_from_state() {
        let client = client();
        let first = client.authorize_url(Provider::Classroom, "state-a");
        let second = client.authorize_url(Provider::Classroom, "state-b");

        // Scope and redirect URI are byte-identical; only the trailing
        // state parameter differs.
        assert_eq!(
            first.strip_suffix("state-a").unwrap(),
            second.strip_suffix("state-b").unwrap()
        );
    }

    #[test]
    fn classroom_url_carries_both_scopes() {
        let client = client();
        let url = client.authorize_url(Provider::Classroom, "n");
        assert!(url.contains(&urlencoding::encode(
            "https://www.googleapis.com/auth/classroom.courses.readonly"
        ).into_owned()));
        assert!(url.contains("classroom.announcements.readonly"));
    }

    #[test]
    fn state_nonces_are_random() {
        assert_ne!(generate_state(), generate_state());
        // 16 bytes encode to 22 base64url characters without padding.
        assert_eq!(generate_state().len(), 22);
    }

    #[test]
    fn token_response_tolerates_missing_fields() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"at"}"#).unwrap();
        assert_eq!(parsed.access_token, "at");
        assert!(parsed.refresh_token.is_none());
        assert!(parsed.expires_in.is_none());
    }

    #[test]
    fn token_set_expiry_is_absolute() {
        let set = TokenSet {
            access_token: "at".into(),
            refresh_token: None,
            expires_in: Some(3599),
        };
        let now = Utc::now();
        assert_eq!(
            set.expiry_from(now),
            Some(now + chrono::Duration::seconds(3599))
        );
    }
}
