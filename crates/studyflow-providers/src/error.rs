//! Error types for provider operations.
//!
//! This module defines the error taxonomy shared by the OAuth client, the
//! token refresher, and the data fetchers.

use std::fmt;
use thiserror::Error;

use studyflow_core::Provider;

/// The category of a provider error.
///
/// This enum provides a high-level classification of errors for use in
/// HTTP responses and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Client id/secret or redirect URI missing or invalid. Fatal; the
    /// flow must not be attempted.
    ConfigurationError,
    /// The caller's session token is invalid or absent, or the provider
    /// rejected the access token outright.
    AuthenticationFailed,
    /// The user denied consent, or the redirect carried a provider error
    /// or an invalid state. Not retryable; the flow is over.
    ConsentDenied,
    /// The code-for-token exchange failed. Authorization codes are single
    /// use, so the whole flow must be restarted.
    ExchangeFailed,
    /// The refresh token is missing, invalid, or revoked. The user must be
    /// sent back through authorization; never auto-retried.
    ReauthorizationRequired,
    /// The provider data API returned a non-2xx response.
    FetchFailed,
    /// The provider data API returned 403 because the API is not enabled
    /// for the project. A one-time setup problem, not a per-user one.
    ApiNotEnabled,
    /// Connection failed, DNS resolution failed, or the response could
    /// not be read.
    NetworkError,
    /// The network deadline was exceeded. Safe to retry.
    Timeout,
    /// The provider returned a payload that could not be parsed.
    InvalidResponse,
    /// Unexpected internal state (store failure, bug).
    InternalError,
}

impl ErrorCode {
    /// Returns true if this error is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError | Self::Timeout)
    }

    /// Returns a machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationError => "configuration_error",
            Self::AuthenticationFailed => "authentication_failed",
            Self::ConsentDenied => "consent_denied",
            Self::ExchangeFailed => "exchange_failed",
            Self::ReauthorizationRequired => "reauthorization_required",
            Self::FetchFailed => "fetch_failed",
            Self::ApiNotEnabled => "api_not_enabled",
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::InvalidResponse => "invalid_response",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to a provider or mutating tokens.
#[derive(Debug, Error)]
pub struct ProviderError {
    /// The error code categorizing this error.
    code: ErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The provider involved, when known.
    provider: Option<Provider>,
    /// HTTP status returned by the provider, for fetch failures.
    status: Option<u16>,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            status: None,
            source: None,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message)
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthenticationFailed, message)
    }

    /// Creates a consent-denied error.
    pub fn consent_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConsentDenied, message)
    }

    /// Creates an exchange error.
    pub fn exchange(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExchangeFailed, message)
    }

    /// Creates a reauthorization-required error.
    pub fn reauthorization_required(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ReauthorizationRequired, message)
    }

    /// Creates a fetch error.
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FetchFailed, message)
    }

    /// Creates an API-not-enabled error.
    pub fn api_not_enabled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiNotEnabled, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidResponse, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Sets the provider for this error.
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets the provider HTTP status for this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider, if set.
    pub fn provider(&self) -> Option<Provider> {
        self.provider
    }

    /// Returns the provider HTTP status, if set.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns true if this error is transient and may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<studyflow_store::StoreError> for ProviderError {
    fn from(err: studyflow_store::StoreError) -> Self {
        ProviderError::internal(format!("credential store failure: {err}")).with_source(err)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Maps a reqwest transport error onto the taxonomy.
pub(crate) fn transport_error(context: &str, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(format!("{context} timed out")).with_source(err)
    } else if err.is_connect() {
        ProviderError::network(format!("{context}: connection failed")).with_source(err)
    } else {
        ProviderError::network(format!("{context}: request failed")).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_retryable() {
        assert!(ErrorCode::NetworkError.is_retryable());
        assert!(ErrorCode::Timeout.is_retryable());
        assert!(!ErrorCode::ReauthorizationRequired.is_retryable());
        assert!(!ErrorCode::ExchangeFailed.is_retryable());
        assert!(!ErrorCode::ConsentDenied.is_retryable());
    }

    #[test]
    fn error_code_display() {
        assert_eq!(
            ErrorCode::ReauthorizationRequired.as_str(),
            "reauthorization_required"
        );
        assert_eq!(ErrorCode::ApiNotEnabled.as_str(), "api_not_enabled");
    }

    #[test]
    fn provider_error_display_includes_provider() {
        let err = ProviderError::fetch("courses call failed")
            .with_provider(Provider::Classroom)
            .with_status(500);
        let display = err.to_string();
        assert!(display.contains("[classroom]"));
        assert!(display.contains("fetch_failed"));
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn store_errors_become_internal() {
        let store_err =
            studyflow_store::StoreError::Io(std::io::Error::other("disk full"));
        let err: ProviderError = store_err.into();
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert!(err.to_string().contains("credential store failure"));
    }
}
