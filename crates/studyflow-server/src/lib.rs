//! HTTP surface for the OAuth connection service.
//!
//! Endpoints:
//!
//! - `POST /auth/google/start` — begin a consent flow, returns the
//!   authorization URL for the caller to open
//! - `GET /auth/google/callback` — provider redirect target; exchanges the
//!   code, stores the credential, and signals the opener window
//! - `GET /fetch/gmail`, `GET /fetch/classroom` — authenticated fetch of
//!   normalized messages / announcements
//! - `DELETE /connections/{provider}` — disconnect (deletes the stored
//!   credential; does not revoke consent at the provider)
//! - `GET /health` — liveness probe
//!
//! Every handler is stateless request-in/response-out; all durable state
//! lives in the credential store.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use studyflow_providers::{AuthenticatedFetcher, OAuthClient};
use studyflow_store::{CredentialStore, StateStore};

use crate::auth::UserResolver;
use crate::error::ApiErr;

/// Handles for a configured Google OAuth client.
#[derive(Clone)]
pub struct GoogleHandles {
    /// OAuth client for authorization URLs and token exchanges.
    pub oauth: Arc<OAuthClient>,
    /// Refresh-then-fetch pipeline for the data endpoints.
    pub fetcher: Arc<AuthenticatedFetcher>,
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Credential rows, one per (user, provider).
    pub credentials: Arc<dyn CredentialStore>,
    /// Pending authorization state nonces.
    pub states: Arc<dyn StateStore>,
    /// Resolves bearer session tokens against the external user store.
    pub resolver: Arc<dyn UserResolver>,
    /// Google OAuth handles; `None` when client credentials are not
    /// configured, in which case the flows fail with a configuration
    /// error instead of being attempted.
    pub google: Option<GoogleHandles>,
}

impl AppState {
    /// Returns the Google handles or a configuration error.
    pub fn google(&self) -> Result<&GoogleHandles, ApiErr> {
        self.google
            .as_ref()
            .ok_or_else(|| ApiErr::internal("Google OAuth client credentials not configured"))
    }
}
