//! Endpoint-level tests of the OAuth flow handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use axum::Json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use studyflow_core::Provider;
use studyflow_providers::{AuthenticatedFetcher, OAuthClient, OAuthConfig};
use studyflow_server::auth::StaticUserResolver;
use studyflow_server::routes::oauth::{self, CallbackParams, StartRequest};
use studyflow_server::{AppState, GoogleHandles};
use studyflow_store::{CredentialStore, MemoryStore};

const SESSION_TOKEN: &str = "session-token";
const USER_ID: &str = "user-1";

fn app_state(server: &MockServer, store: Arc<MemoryStore>) -> AppState {
    let config = OAuthConfig::new(
        "client-id",
        "client-secret",
        "https://app.test/auth/google/callback",
    )
    .with_token_url(format!("{}/token", server.uri()))
    .with_gmail_base_url(format!("{}/gmail/v1", server.uri()))
    .with_classroom_base_url(format!("{}/classroom/v1", server.uri()))
    .with_timeout(Duration::from_secs(5));

    let oauth = Arc::new(OAuthClient::new(config).unwrap());
    let fetcher = Arc::new(
        AuthenticatedFetcher::new(store.clone() as Arc<dyn CredentialStore>, oauth.clone())
            .unwrap(),
    );

    AppState {
        credentials: store.clone(),
        states: store,
        resolver: Arc::new(StaticUserResolver::with_user(SESSION_TOKEN, USER_ID)),
        google: Some(GoogleHandles { oauth, fetcher }),
    }
}

fn session_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {SESSION_TOKEN}")).unwrap(),
    );
    headers
}

fn state_from_url(auth_url: &str) -> String {
    auth_url
        .split("state=")
        .nth(1)
        .expect("authorization URL has a state parameter")
        .to_string()
}

#[tokio::test]
async fn connect_gmail_stores_credential() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let app = app_state(&server, store.clone());

    // Start: the URL carries the read-only mail scope and a state nonce.
    let Json(start) = oauth::start(
        State(app.clone()),
        session_headers(),
        Json(StartRequest {
            provider: Provider::Gmail,
        }),
    )
    .await
    .unwrap();

    assert!(start.auth_url.contains("gmail.readonly"));
    assert!(start.auth_url.contains("access_type=offline"));
    assert!(start.auth_url.contains("prompt=consent"));
    let state_nonce = state_from_url(&start.auth_url);
    assert!(!state_nonce.is_empty());

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Callback: the popup page signals success to the opener.
    let page = oauth::callback(
        State(app),
        Query(CallbackParams {
            code: Some("auth-code".into()),
            state: Some(state_nonce),
            error: None,
        }),
    )
    .await;

    assert!(page.0.contains("oauth-success"));
    assert!(page.0.contains("provider:'gmail'"));

    let cred = store.get(USER_ID, Provider::Gmail).unwrap().unwrap();
    assert_eq!(cred.access_token, "access-1");
    assert_eq!(cred.refresh_token.as_deref(), Some("refresh-1"));
    assert!(cred.token_expiry.is_some());
}

#[tokio::test]
async fn consent_denied_skips_exchange_and_store() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let app = app_state(&server, store.clone());

    // The token endpoint must not be called at all.
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let page = oauth::callback(
        State(app),
        Query(CallbackParams {
            code: Some("auth-code".into()),
            state: Some("whatever".into()),
            error: Some("access_denied".into()),
        }),
    )
    .await;

    assert!(page.0.contains("Authentication failed"));
    assert!(page.0.contains("access_denied"));
    assert!(store.get(USER_ID, Provider::Gmail).unwrap().is_none());
}

#[tokio::test]
async fn state_nonce_cannot_be_replayed() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let app = app_state(&server, store.clone());

    let Json(start) = oauth::start(
        State(app.clone()),
        session_headers(),
        Json(StartRequest {
            provider: Provider::Classroom,
        }),
    )
    .await
    .unwrap();
    let state_nonce = state_from_url(&start.auth_url);

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-1",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = |code: &str| CallbackParams {
        code: Some(code.into()),
        state: Some(state_nonce.clone()),
        error: None,
    };

    let first = oauth::callback(State(app.clone()), Query(params("code-1"))).await;
    assert!(first.0.contains("oauth-success"));

    // Replay with the consumed nonce: no second exchange, failure page.
    let second = oauth::callback(State(app), Query(params("code-2"))).await;
    assert!(second.0.contains("Authentication failed"));
    assert!(second.0.contains("state"));
}

#[tokio::test]
async fn callback_with_unknown_state_fails() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let app = app_state(&server, store.clone());

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let page = oauth::callback(
        State(app),
        Query(CallbackParams {
            code: Some("auth-code".into()),
            state: Some("forged-state".into()),
            error: None,
        }),
    )
    .await;

    assert!(page.0.contains("Authentication failed"));
    assert!(store.get(USER_ID, Provider::Gmail).unwrap().is_none());
}

#[tokio::test]
async fn start_requires_session_token() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let app = app_state(&server, store);

    let err = oauth::start(
        State(app),
        HeaderMap::new(),
        Json(StartRequest {
            provider: Provider::Gmail,
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let app = app_state(&server, store.clone());

    store
        .upsert(
            USER_ID,
            Provider::Gmail,
            &studyflow_store::TokenWrite {
                access_token: "access".into(),
                refresh_token: Some("refresh".into()),
                token_expiry: None,
            },
        )
        .unwrap();

    let Json(body) = oauth::disconnect(
        State(app.clone()),
        session_headers(),
        Path("gmail".to_string()),
    )
    .await
    .unwrap();
    assert_eq!(body["disconnected"], "gmail");
    assert!(store.get(USER_ID, Provider::Gmail).unwrap().is_none());

    // Second disconnect still succeeds.
    let Json(body) = oauth::disconnect(State(app), session_headers(), Path("gmail".to_string()))
        .await
        .unwrap();
    assert_eq!(body["disconnected"], "gmail");
}

#[tokio::test]
async fn disconnect_rejects_unknown_provider() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let app = app_state(&server, store);

    let err = oauth::disconnect(State(app), session_headers(), Path("calendar".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
}
