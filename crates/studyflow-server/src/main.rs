use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use studyflow_core::{init_tracing, TracingConfig};
use studyflow_providers::{AuthenticatedFetcher, OAuthClient, OAuthConfig};
use studyflow_server::auth::{HttpUserResolver, UnconfiguredResolver, UserResolver};
use studyflow_server::config::ServerConfig;
use studyflow_server::{routes, AppState, GoogleHandles};
use studyflow_store::SqliteStore;

/// Timeout for calls to the identity platform's userinfo endpoint.
const USERINFO_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(TracingConfig::server()).context("failed to initialize tracing")?;

    let config = ServerConfig::from_env();
    info!(data_dir = %config.data_dir.display(), "starting studyflow server");

    let store = Arc::new(SqliteStore::open(config.db_path()).context("opening credential store")?);

    let google = match &config.google {
        Some(credentials) => {
            let oauth_config = OAuthConfig::new(
                credentials.client_id.clone(),
                credentials.client_secret.clone(),
                config.redirect_uri(),
            );
            let oauth = Arc::new(OAuthClient::new(oauth_config).context("building OAuth client")?);
            let fetcher = Arc::new(
                AuthenticatedFetcher::new(store.clone(), oauth.clone())
                    .context("building fetcher")?,
            );
            info!("Google OAuth enabled");
            Some(GoogleHandles { oauth, fetcher })
        }
        None => {
            warn!("GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET not set - OAuth flows disabled");
            None
        }
    };

    let resolver: Arc<dyn UserResolver> = match &config.userinfo_url {
        Some(url) => Arc::new(
            HttpUserResolver::new(url.clone(), USERINFO_TIMEOUT)
                .map_err(|e| anyhow::anyhow!("building user resolver: {e}"))?,
        ),
        None => {
            warn!("SESSION_USERINFO_URL not set - authenticated endpoints will fail closed");
            Arc::new(UnconfiguredResolver)
        }
    };

    let state = AppState {
        credentials: store.clone(),
        states: store,
        resolver,
        google,
    };

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
