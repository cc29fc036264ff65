//! OAuth flow endpoints: start, callback, disconnect.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Html;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use studyflow_core::Provider;
use studyflow_providers::{generate_state, ProviderError};
use studyflow_store::{AuthState, TokenWrite};

use crate::auth::authenticate;
use crate::error::ApiErr;
use crate::AppState;

/// Body of the start request.
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    /// Which provider to connect.
    pub provider: Provider,
}

/// Response of the start request.
#[derive(Debug, Serialize)]
pub struct StartResponse {
    /// Fully formed authorization URL; the caller opens it (e.g. in a
    /// popup) and is responsible for detecting popup-blocked conditions.
    #[serde(rename = "authUrl")]
    pub auth_url: String,
}

/// POST /auth/google/start — begin a consent flow.
///
/// Resolves the caller, issues a single-use state nonce bound to them,
/// and returns the provider authorization URL.
pub async fn start(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiErr> {
    let google = app.google()?.clone();
    let user_id = authenticate(&app, &headers).await?;

    // Opportunistic housekeeping; a failure here never blocks the flow.
    if let Err(e) = app.states.purge_expired_states(Utc::now()) {
        warn!(error = %e, "failed to purge expired authorization states");
    }

    let nonce = generate_state();
    let state = AuthState::issue(nonce.as_str(), request.provider, user_id.as_str(), Utc::now());
    app.states.insert_state(&state)?;

    let auth_url = google.oauth.authorize_url(request.provider, &nonce);
    info!(user_id = %user_id, provider = %request.provider, "authorization flow started");

    Ok(Json(StartResponse { auth_url }))
}

/// Query parameters of the provider redirect.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    /// Single-use authorization code.
    pub code: Option<String>,
    /// State nonce issued by the start endpoint.
    pub state: Option<String>,
    /// Provider error, e.g. `access_denied` when the user refused consent.
    pub error: Option<String>,
}

/// GET /auth/google/callback — provider redirect target.
///
/// Always answers with a terminal HTML page: on success it posts
/// `{type: "oauth-success", provider}` to the opener window and closes,
/// on failure it reports the error and closes. The page is the transport
/// of the terminal signal; nothing about the flow is left pending.
pub async fn callback(State(app): State<AppState>, Query(params): Query<CallbackParams>) -> Html<String> {
    match run_callback(&app, params).await {
        Ok(provider) => Html(success_page(provider)),
        Err(e) => {
            warn!(error = %e, "authorization callback failed");
            Html(failure_page(e.message()))
        }
    }
}

/// The callback flow proper. Nothing is written to the credential store
/// before the final upsert, so a failure at any step leaves no
/// half-written row.
async fn run_callback(app: &AppState, params: CallbackParams) -> Result<Provider, ProviderError> {
    if let Some(error) = params.error {
        // The provider reported failure at redirect; do not attempt the
        // exchange.
        return Err(ProviderError::consent_denied(format!(
            "authorization denied: {error}"
        )));
    }

    let google = app
        .google
        .as_ref()
        .ok_or_else(|| ProviderError::configuration("Google OAuth client credentials not configured"))?;

    let code = params
        .code
        .ok_or_else(|| ProviderError::consent_denied("missing code parameter"))?;
    let nonce = params
        .state
        .ok_or_else(|| ProviderError::consent_denied("missing state parameter"))?;

    // Consume the nonce before exchanging: unknown, reused, or expired
    // states terminate the flow, and the row binds the exchange to the
    // user who initiated it.
    let state = app
        .states
        .take_state(&nonce)?
        .ok_or_else(|| ProviderError::consent_denied("unknown or already used state"))?;
    if state.is_expired_at(Utc::now()) {
        return Err(ProviderError::consent_denied("authorization state expired"));
    }

    debug!(user_id = %state.user_id, provider = %state.provider, "exchanging authorization code");
    let tokens = google.oauth.exchange_code(&code).await?;

    let now = Utc::now();
    let write = TokenWrite {
        access_token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
        token_expiry: tokens.expiry_from(now),
    };
    app.credentials
        .upsert(&state.user_id, state.provider, &write)?;

    info!(user_id = %state.user_id, provider = %state.provider, "provider connected");
    Ok(state.provider)
}

/// DELETE /connections/{provider} — disconnect a provider.
///
/// Deletes the stored credential; consent at the provider is not revoked.
/// Idempotent: disconnecting an unconnected provider is still success.
pub async fn disconnect(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(provider): Path<String>,
) -> Result<Json<serde_json::Value>, ApiErr> {
    let provider: Provider = provider
        .parse()
        .map_err(|e: studyflow_core::UnknownProvider| ApiErr::bad_request(e.to_string()))?;
    let user_id = authenticate(&app, &headers).await?;

    let existed = app.credentials.delete(&user_id, provider)?;
    if existed {
        info!(user_id = %user_id, provider = %provider, "provider disconnected");
    }

    Ok(Json(serde_json::json!({"disconnected": provider.as_str()})))
}

fn success_page(provider: Provider) -> String {
    format!(
        "<html><body><script>window.opener.postMessage({{type:'oauth-success',provider:'{}'}},'*');window.close();</script>\
        <p>Authentication successful! You can close this window.</p></body></html>",
        provider.as_str()
    )
}

fn failure_page(message: &str) -> String {
    format!(
        "<html><body><script>window.close();</script>\
        <p>Authentication failed: {}. You can close this window.</p></body></html>",
        html_escape(message)
    )
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
