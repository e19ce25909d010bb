// Authentication extractors
// Decision: The session travels only in the HTTP-only `auth_token` cookie
// Decision: Verification fails closed; every failure reads as "no session"

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    config::{AuthConfig, SESSION_COOKIE},
    jwt::JwtService,
};
use crate::storage::StorageBackend;

/// Authentication error
#[derive(Debug, Clone, Serialize)]
pub struct AuthError {
    pub error: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl AuthError {
    pub fn unauthorized(message: &str) -> Self {
        Self {
            error: message.to_string(),
            status: StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// The user behind a valid session cookie
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub jwt_service: Arc<JwtService>,
    pub db: Arc<StorageBackend>,
}

impl AuthState {
    pub fn new(config: AuthConfig, db: Arc<StorageBackend>) -> Self {
        let jwt_service = Arc::new(JwtService::new(&config));
        Self {
            config,
            jwt_service,
            db,
        }
    }

    /// Resolve a session token to its user. `None` for a bad signature, an expired
    /// token, an unknown email, or a storage failure.
    pub async fn verify_session(&self, token: &str) -> Option<AuthUser> {
        let claims = match self.jwt_service.validate(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Session token rejected: {:#}", e);
                return None;
            }
        };

        match self.db.get_user_by_email(&claims.email).await {
            Ok(Some(user)) => Some(AuthUser {
                id: user.id,
                username: user.username,
                email: user.email,
            }),
            Ok(None) => {
                tracing::debug!("Session token for unknown user");
                None
            }
            Err(e) => {
                tracing::warn!("Failed to resolve session user: {:#}", e);
                None
            }
        }
    }
}

/// Extractor for authenticated user
/// This is required - returns 401 if not authenticated
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        extract_auth_user(parts, &auth_state).await
    }
}

/// Helper trait for extracting AuthState from application state
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AuthState> for AuthState {
    fn from_ref(input: &AuthState) -> Self {
        input.clone()
    }
}

async fn extract_auth_user(parts: &Parts, auth_state: &AuthState) -> Result<AuthUser, AuthError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AuthError::unauthorized("Not authenticated"))?;

    auth_state
        .verify_session(&token)
        .await
        .ok_or_else(|| AuthError::unauthorized("Invalid token or user not found"))
}
