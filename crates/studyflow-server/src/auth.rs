//! Bearer-session resolution against the external user store.
//!
//! The hosted identity platform is consumed as an opaque service: a
//! session token goes in, a user id comes out. [`UserResolver`] is the
//! seam; the HTTP implementation calls the platform's userinfo endpoint,
//! and tests use [`StaticUserResolver`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::Deserialize;
use thiserror::Error;

use crate::error::ApiErr;
use crate::AppState;

/// Boxed future type used for resolver trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors from session resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The session token is invalid, expired, or unknown.
    #[error("session token rejected")]
    InvalidToken,
    /// The user store could not be reached or answered unexpectedly.
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a bearer session token to the owning user id.
pub trait UserResolver: Send + Sync {
    /// Resolves `session_token`, failing closed on any doubt.
    fn resolve<'a>(&'a self, session_token: &'a str) -> BoxFuture<'a, Result<String, ResolveError>>;
}

/// Resolver backed by the identity platform's userinfo endpoint.
///
/// Sends the session token as a bearer header and expects a JSON body
/// with an `id` field.
pub struct HttpUserResolver {
    http_client: reqwest::Client,
    userinfo_url: String,
}

impl HttpUserResolver {
    /// Creates a resolver for the given userinfo endpoint.
    pub fn new(userinfo_url: impl Into<String>, timeout: Duration) -> Result<Self, ResolveError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolveError::Unavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            userinfo_url: userinfo_url.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    id: String,
}

impl UserResolver for HttpUserResolver {
    fn resolve<'a>(&'a self, session_token: &'a str) -> BoxFuture<'a, Result<String, ResolveError>> {
        Box::pin(async move {
            let response = self
                .http_client
                .get(&self.userinfo_url)
                .bearer_auth(session_token)
                .send()
                .await
                .map_err(|e| ResolveError::Unavailable(format!("userinfo request failed: {e}")))?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(ResolveError::InvalidToken);
            }
            if !status.is_success() {
                return Err(ResolveError::Unavailable(format!(
                    "userinfo returned {status}"
                )));
            }

            let info: UserInfo = response
                .json()
                .await
                .map_err(|e| ResolveError::Unavailable(format!("invalid userinfo body: {e}")))?;

            if info.id.is_empty() {
                return Err(ResolveError::InvalidToken);
            }
            Ok(info.id)
        })
    }
}

/// Fixed token-to-user mapping for tests.
#[derive(Debug, Default)]
pub struct StaticUserResolver {
    users: HashMap<String, String>,
}

impl StaticUserResolver {
    /// Creates a resolver knowing a single session.
    pub fn with_user(session_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let mut users = HashMap::new();
        users.insert(session_token.into(), user_id.into());
        Self { users }
    }
}

impl UserResolver for StaticUserResolver {
    fn resolve<'a>(&'a self, session_token: &'a str) -> BoxFuture<'a, Result<String, ResolveError>> {
        let result = self
            .users
            .get(session_token)
            .cloned()
            .ok_or(ResolveError::InvalidToken);
        Box::pin(async move { result })
    }
}

/// Resolver used when no userinfo endpoint is configured; rejects
/// everything so authenticated endpoints fail closed.
#[derive(Debug, Default)]
pub struct UnconfiguredResolver;

impl UserResolver for UnconfiguredResolver {
    fn resolve<'a>(&'a self, _session_token: &'a str) -> BoxFuture<'a, Result<String, ResolveError>> {
        Box::pin(async move {
            Err(ResolveError::Unavailable(
                "session userinfo endpoint not configured".to_string(),
            ))
        })
    }
}

/// Extracts the bearer token from an Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolves the acting user for a request, failing closed.
pub async fn authenticate(app: &AppState, headers: &HeaderMap) -> Result<String, ApiErr> {
    let token =
        bearer_token(headers).ok_or_else(|| ApiErr::unauthorized("missing authorization header"))?;

    match app.resolver.resolve(token).await {
        Ok(user_id) => Ok(user_id),
        Err(ResolveError::InvalidToken) => Err(ApiErr::unauthorized("invalid session token")),
        Err(ResolveError::Unavailable(message)) => {
            tracing::error!(error = %message, "user resolution failed");
            Err(ApiErr::internal("failed to resolve user"))
        }
    }
}
