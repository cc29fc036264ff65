//! Server configuration loaded from environment variables.

use std::path::PathBuf;

/// Google OAuth client credentials.
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    /// OAuth 2.0 client id.
    pub client_id: String,
    /// OAuth 2.0 client secret.
    pub client_secret: String,
}

/// Everything the server reads from the environment, once, at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: String,
    /// Externally visible base URL; the callback URL registered with the
    /// provider is derived from it.
    pub base_url: String,
    /// Directory holding the SQLite database.
    pub data_dir: PathBuf,
    /// Google client credentials; `None` disables the OAuth flows.
    pub google: Option<GoogleCredentials>,
    /// Userinfo endpoint of the identity platform; `None` disables
    /// session resolution (authenticated endpoints fail closed).
    pub userinfo_url: Option<String>,
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

impl ServerConfig {
    /// Reads the configuration from the environment.
    pub fn from_env() -> Self {
        let google = match (
            env_nonempty("GOOGLE_CLIENT_ID"),
            env_nonempty("GOOGLE_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(client_secret)) => Some(GoogleCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        Self {
            bind_addr: env_nonempty("STUDYFLOW_BIND").unwrap_or_else(|| "127.0.0.1:3000".into()),
            base_url: env_nonempty("STUDYFLOW_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".into()),
            data_dir: env_nonempty("STUDYFLOW_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            google,
            userinfo_url: env_nonempty("SESSION_USERINFO_URL"),
        }
    }

    /// The callback URL registered with the provider.
    ///
    /// Must match byte-for-byte between the authorization request and the
    /// code exchange.
    pub fn redirect_uri(&self) -> String {
        format!(
            "{}/auth/google/callback",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("studyflow.db")
    }
}
