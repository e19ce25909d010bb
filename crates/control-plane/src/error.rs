// API error taxonomy
// Decision: Every failure leaves the server as `{ "error": "<message>" }`
// Decision: Internal errors are logged with their full chain and surfaced as a generic 500

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contentdesk_upstream::UpstreamError;
use thiserror::Error;

use crate::api::common::ErrorResponse;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate of an existing unique value (400, matching the signup contract)
    #[error("{0}")]
    Conflict(String),

    /// A required endpoint or key is missing from configuration (500)
    #[error("{0}")]
    NotConfigured(String),

    /// Upstream replied with a non-2xx status
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    #[error("{0}")]
    UpstreamUnreachable(String),

    /// Upstream replied 2xx with a body we cannot use
    #[error("{0}")]
    UpstreamResponse(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found() -> Self {
        ApiError::NotFound("Not found".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotConfigured(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Upstream { status, .. } => {
                if status.is_client_error() || status.is_server_error() {
                    *status
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            ApiError::UpstreamUnreachable(_) | ApiError::UpstreamResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "Internal error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        };
        ErrorResponse::new(message)
            .with_status(status)
            .into_response()
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::NotConfigured(_) => ApiError::NotConfigured(err.to_string()),
            UpstreamError::Unreachable { .. } => ApiError::UpstreamUnreachable(err.to_string()),
            UpstreamError::Status { status, message } => {
                // reqwest and axum share the `http` crate, so the status carries over
                ApiError::Upstream { status, message }
            }
            UpstreamError::InvalidResponse(message) => ApiError::UpstreamResponse(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
        ApiError::Validation("Invalid JSON body".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected query string");
        ApiError::Validation("Invalid query string".to_string())
    }
}

/// `Json` extractor whose rejection is an [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejection is an [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
