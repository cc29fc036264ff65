//! Google OAuth client configuration.

use std::time::Duration;

/// Google OAuth endpoints.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google data API base URLs.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
pub const CLASSROOM_API_BASE: &str = "https://classroom.googleapis.com/v1";

/// Configuration for the Google OAuth client and data fetchers.
///
/// The endpoint base URLs default to Google's production hosts and exist as
/// fields so tests can point the client at a local server.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth 2.0 client id from the Google Cloud Console.
    pub client_id: String,
    /// OAuth 2.0 client secret from the Google Cloud Console.
    pub client_secret: String,
    /// Callback URL registered with the provider. Must match exactly
    /// between the authorization request and the code exchange.
    pub redirect_uri: String,
    /// Authorization endpoint.
    pub auth_url: String,
    /// Token endpoint (code exchange and refresh).
    pub token_url: String,
    /// Gmail API base URL.
    pub gmail_base_url: String,
    /// Classroom API base URL.
    pub classroom_base_url: String,
    /// Request timeout for all outbound calls.
    pub timeout: Duration,
    /// User agent string for API requests.
    pub user_agent: String,
}

impl OAuthConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration with production endpoints.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            gmail_base_url: GMAIL_API_BASE.to_string(),
            classroom_base_url: CLASSROOM_API_BASE.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("studyflow/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the authorization endpoint.
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Sets the token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Sets the Gmail API base URL.
    pub fn with_gmail_base_url(mut self, url: impl Into<String>) -> Self {
        self.gmail_base_url = url.into();
        self
    }

    /// Sets the Classroom API base URL.
    pub fn with_classroom_base_url(mut self, url: impl Into<String>) -> Self {
        self.classroom_base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates that the configuration is usable.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        if self.redirect_uri.is_empty() {
            return Err("redirect_uri is required");
        }
        Ok(())
    }
}
