// Common DTOs for public API
//
// These types are shared across multiple API endpoints.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Standard error response for API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message describing what went wrong.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Convert to axum response tuple
    pub fn with_status(self, status: StatusCode) -> (StatusCode, Json<Self>) {
        (status, Json(self))
    }
}

/// `{ "status": "deleted" }`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "deleted")]
    pub status: String,
}

impl StatusResponse {
    pub fn deleted() -> Self {
        Self {
            status: "deleted".to_string(),
        }
    }
}

/// `?id=<uuid>` on DELETE routes. Kept as a string so a malformed id
/// gets the API's own 400 instead of the extractor's.
#[derive(Debug, Deserialize, IntoParams)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    pub fn parse(&self) -> Result<uuid::Uuid, crate::error::ApiError> {
        self.id
            .as_deref()
            .map(str::trim)
            .and_then(|raw| uuid::Uuid::parse_str(raw).ok())
            .ok_or_else(|| crate::error::ApiError::validation("Invalid id"))
    }
}
