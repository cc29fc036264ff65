//! Unified API error type.
//!
//! Every request-boundary failure becomes a `{"error": "<message>"}` JSON
//! response; nothing is left hanging. The callback endpoint is the one
//! exception — it renders a terminal HTML page instead and never uses
//! this type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use studyflow_providers::{ErrorCode, ProviderError};

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiErr {
    status: StatusCode,
    message: String,
}

impl ApiErr {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }

    /// Returns the HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the message sent to the caller.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ProviderError> for ApiErr {
    fn from(err: ProviderError) -> Self {
        let status = match err.code() {
            ErrorCode::AuthenticationFailed | ErrorCode::ReauthorizationRequired => {
                StatusCode::UNAUTHORIZED
            }
            ErrorCode::ConsentDenied => StatusCode::BAD_REQUEST,
            ErrorCode::FetchFailed | ErrorCode::ApiNotEnabled | ErrorCode::NetworkError => {
                StatusCode::BAD_GATEWAY
            }
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::ConfigurationError
            | ErrorCode::ExchangeFailed
            | ErrorCode::InvalidResponse
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %err, "provider failure");
        } else {
            tracing::warn!(error = %err, "provider request rejected");
        }

        Self {
            status,
            message: err.message().to_string(),
        }
    }
}

impl From<studyflow_store::StoreError> for ApiErr {
    fn from(err: studyflow_store::StoreError) -> Self {
        tracing::error!(error = %err, "store failure");
        Self::internal("internal server error")
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({"error": self.message})),
        )
            .into_response()
    }
}
