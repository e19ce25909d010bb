// X credential and posting HTTP routes
// Decision: Responses only ever report whether credentials exist, never their values
// Decision: /api/x/post is a stub; it proves the credentials load and echoes the text

use axum::{extract::State, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::common::ErrorResponse;
use super::validation::{provided, require};
use crate::auth::{AuthState, AuthUser, FromRef};
use crate::error::{ApiError, ApiJson};
use crate::services::CredentialVault;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveXCredentialsRequest {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub bearer_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectionStatus {
    pub connected: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CredentialsChanged {
    #[schema(example = "X credentials saved")]
    pub message: String,
    pub connected: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct XPostRequest {
    #[schema(example = "Shipping the new dashboard today.")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct XPostResponse {
    pub ok: bool,
    pub posted: String,
}

#[derive(Clone)]
pub struct XState {
    pub vault: Arc<CredentialVault>,
    pub auth: AuthState,
}

impl FromRef<XState> for AuthState {
    fn from_ref(input: &XState) -> Self {
        input.auth.clone()
    }
}

pub fn routes(state: XState) -> Router {
    Router::new()
        .route(
            "/api/user/x-credentials",
            get(get_status).put(save_credentials).delete(remove_credentials),
        )
        .route("/api/x/post", post(post_to_x))
        .with_state(state)
}

/// GET /api/user/x-credentials - Whether X credentials are stored
#[utoipa::path(
    get,
    path = "/api/user/x-credentials",
    responses(
        (status = 200, description = "Connection status", body = ConnectionStatus),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "x"
)]
pub async fn get_status(
    State(state): State<XState>,
    user: AuthUser,
) -> Result<Json<ConnectionStatus>, ApiError> {
    let connected = state.vault.status(user.id).await?;
    Ok(Json(ConnectionStatus { connected }))
}

/// PUT /api/user/x-credentials - Store (or replace) X credentials
#[utoipa::path(
    put,
    path = "/api/user/x-credentials",
    request_body = SaveXCredentialsRequest,
    responses(
        (status = 200, description = "Credentials saved", body = CredentialsChanged),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 500, description = "Credential storage not configured", body = ErrorResponse)
    ),
    tag = "x"
)]
pub async fn save_credentials(
    State(state): State<XState>,
    user: AuthUser,
    ApiJson(req): ApiJson<SaveXCredentialsRequest>,
) -> Result<Json<CredentialsChanged>, ApiError> {
    let (Some(api_key), Some(api_secret), Some(bearer_token)) = (
        provided(req.api_key.as_deref()),
        provided(req.api_secret.as_deref()),
        provided(req.bearer_token.as_deref()),
    ) else {
        return Err(ApiError::validation(
            "API key, API secret, and bearer token are required",
        ));
    };

    state
        .vault
        .save(user.id, api_key, api_secret, bearer_token)
        .await?;
    Ok(Json(CredentialsChanged {
        message: "X credentials saved".to_string(),
        connected: true,
    }))
}

/// DELETE /api/user/x-credentials - Remove stored X credentials
#[utoipa::path(
    delete,
    path = "/api/user/x-credentials",
    responses(
        (status = 200, description = "Credentials removed", body = CredentialsChanged),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "x"
)]
pub async fn remove_credentials(
    State(state): State<XState>,
    user: AuthUser,
) -> Result<Json<CredentialsChanged>, ApiError> {
    state.vault.remove(user.id).await?;
    Ok(Json(CredentialsChanged {
        message: "X credentials removed".to_string(),
        connected: false,
    }))
}

/// POST /api/x/post - Post text to X with the stored credentials
#[utoipa::path(
    post,
    path = "/api/x/post",
    request_body = XPostRequest,
    responses(
        (status = 200, description = "Posted", body = XPostResponse),
        (status = 400, description = "Missing text or incomplete credentials", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "x"
)]
pub async fn post_to_x(
    State(state): State<XState>,
    user: AuthUser,
    ApiJson(req): ApiJson<XPostRequest>,
) -> Result<Json<XPostResponse>, ApiError> {
    let text = require(req.text.as_deref(), "Text is required.")?;

    let _credentials = state.vault.load_for_posting(user.id).await?;
    tracing::info!(user_id = %user.id, chars = text.chars().count(), "X post accepted");

    Ok(Json(XPostResponse {
        ok: true,
        posted: text.to_string(),
    }))
}
