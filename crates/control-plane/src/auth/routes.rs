// Authentication HTTP routes
// Decision: Signup and login share POST /api/auth, selected by `action`
// Decision: Only login issues the session cookie; signup returns the new id and nothing else

use axum::{extract::State, routing::get, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    config::SESSION_COOKIE,
    middleware::{AuthState, AuthUser},
};
use crate::api::common::ErrorResponse;
use crate::api::validation::non_blank;
use crate::error::{ApiError, ApiJson};
use crate::services::UserService;

/// Signup or login request
#[derive(Deserialize, ToSchema)]
pub struct AuthRequest {
    /// `signup` or `login`
    #[schema(example = "login")]
    pub action: Option<String>,
    /// Required for signup
    pub username: Option<String>,
    #[schema(example = "writer@example.com")]
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthUserSummary {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    #[schema(example = "Login successful")]
    pub message: String,
    pub user: AuthUserSummary,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Whether X credentials are stored for this user
    pub has_x_credentials: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: CurrentUser,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/api/auth", post(authenticate))
        .route("/api/logout", post(logout))
        .route("/api/me", get(get_current_user))
        .with_state(state)
}

/// POST /api/auth - Sign up or log in
#[utoipa::path(
    post,
    path = "/api/auth",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Signed up or logged in", body = AuthResponse),
        (status = 400, description = "Missing fields, invalid action, or email taken", body = ErrorResponse),
        (status = 401, description = "Incorrect password", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn authenticate(
    State(state): State<AuthState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<AuthRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let (Some(action), Some(email), Some(password)) = (
        non_blank(req.action.as_deref()),
        non_blank(req.email.as_deref()),
        req.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::validation("Missing fields"));
    };

    let users = UserService::new(state.db.clone());
    match action {
        "signup" => {
            let username = non_blank(req.username.as_deref())
                .ok_or_else(|| ApiError::validation("Username required for signup"))?;
            let user = users.signup(username, email, password).await?;
            Ok((
                jar,
                Json(AuthResponse {
                    message: "User created".to_string(),
                    user: AuthUserSummary {
                        id: user.id,
                        email: user.email,
                    },
                }),
            ))
        }
        "login" => {
            let user = users.login(email, password).await?;
            let token = state.jwt_service.issue(&user.email)?;
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .secure(state.config.cookie_secure)
                .same_site(SameSite::Lax)
                .max_age(time::Duration::seconds(state.config.session_lifetime_secs()))
                .build();

            tracing::info!(user_id = %user.id, "User logged in");
            Ok((
                jar.add(cookie),
                Json(AuthResponse {
                    message: "Login successful".to_string(),
                    user: AuthUserSummary {
                        id: user.id,
                        email: user.email,
                    },
                }),
            ))
        }
        _ => Err(ApiError::validation("Invalid action")),
    }
}

/// POST /api/logout - Clear the session cookie
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse)
    ),
    tag = "auth"
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    (
        // Expired cookie even when the request carried none
        jar.add(
            Cookie::build((SESSION_COOKIE, ""))
                .path("/")
                .http_only(true)
                .max_age(time::Duration::ZERO),
        ),
        Json(LogoutResponse {
            message: "Logged out".to_string(),
        }),
    )
}

/// GET /api/me - The user behind the session cookie
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    State(state): State<AuthState>,
    user: AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let has_x_credentials = state.db.has_x_credential(user.id).await?;
    Ok(Json(MeResponse {
        user: CurrentUser {
            id: user.id,
            username: user.username,
            email: user.email,
            has_x_credentials,
        },
    }))
}
