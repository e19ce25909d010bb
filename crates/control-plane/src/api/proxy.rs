// AI backend pass-through routes
// Decision: One thin handler per workflow so each shows up in the OpenAPI document

use axum::{extract::State, routing::post, Json, Router};
use serde_json::Value;
use std::sync::Arc;

use super::common::ErrorResponse;
use crate::auth::{AuthState, AuthUser, FromRef};
use crate::error::{ApiError, ApiJson};
use crate::services::{Workflow, WorkflowService};

#[derive(Clone)]
pub struct ProxyState {
    pub service: Arc<WorkflowService>,
    pub auth: AuthState,
}

impl FromRef<ProxyState> for AuthState {
    fn from_ref(input: &ProxyState) -> Self {
        input.auth.clone()
    }
}

pub fn routes(state: ProxyState) -> Router {
    Router::new()
        .route("/api/generate-blog", post(generate_blog))
        .route("/api/generate-news", post(generate_news))
        .route("/api/repurpose-article", post(repurpose_article))
        .route("/api/youtube-blog", post(youtube_blog))
        .route("/api/x-post/generate", post(x_post_generate))
        .route("/api/x-post/ideas", post(x_post_ideas))
        .route("/api/generate-visual-post", post(generate_visual_post))
        .route("/api/image-prompt", post(image_prompt))
        .with_state(state)
}

async fn forward(
    state: &ProxyState,
    workflow: Workflow,
    user: &AuthUser,
    body: Value,
) -> Result<Json<Value>, ApiError> {
    let reply = state.service.run(workflow, user, body).await?;
    Ok(Json(reply))
}

/// POST /api/generate-blog - Run the blog workflow
#[utoipa::path(
    post,
    path = "/api/generate-blog",
    request_body = Value,
    responses(
        (status = 200, description = "AI backend reply", body = Value),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 502, description = "AI backend failed", body = ErrorResponse)
    ),
    tag = "workflows"
)]
pub async fn generate_blog(
    State(state): State<ProxyState>,
    user: AuthUser,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, ApiError> {
    forward(&state, Workflow::GenerateBlog, &user, body).await
}

/// POST /api/generate-news - Run the newsroom workflow
#[utoipa::path(
    post,
    path = "/api/generate-news",
    request_body = Value,
    responses(
        (status = 200, description = "AI backend reply", body = Value),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 502, description = "AI backend failed", body = ErrorResponse)
    ),
    tag = "workflows"
)]
pub async fn generate_news(
    State(state): State<ProxyState>,
    user: AuthUser,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, ApiError> {
    forward(&state, Workflow::GenerateNews, &user, body).await
}

/// POST /api/repurpose-article - Repurpose an article (`article_text` required)
#[utoipa::path(
    post,
    path = "/api/repurpose-article",
    request_body = Value,
    responses(
        (status = 200, description = "AI backend reply", body = Value),
        (status = 400, description = "Article text missing", body = ErrorResponse),
        (status = 502, description = "AI backend failed", body = ErrorResponse)
    ),
    tag = "workflows"
)]
pub async fn repurpose_article(
    State(state): State<ProxyState>,
    user: AuthUser,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, ApiError> {
    forward(&state, Workflow::RepurposeArticle, &user, body).await
}

/// POST /api/youtube-blog - Blog from a YouTube video (`youtube_url` required)
#[utoipa::path(
    post,
    path = "/api/youtube-blog",
    request_body = Value,
    responses(
        (status = 200, description = "AI backend reply", body = Value),
        (status = 400, description = "YouTube URL missing", body = ErrorResponse),
        (status = 502, description = "AI backend failed", body = ErrorResponse)
    ),
    tag = "workflows"
)]
pub async fn youtube_blog(
    State(state): State<ProxyState>,
    user: AuthUser,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, ApiError> {
    forward(&state, Workflow::YoutubeBlog, &user, body).await
}

/// POST /api/x-post/generate - Draft an X post (`topic` and `objective` required)
#[utoipa::path(
    post,
    path = "/api/x-post/generate",
    request_body = Value,
    responses(
        (status = 200, description = "AI backend reply", body = Value),
        (status = 400, description = "Topic or objective missing", body = ErrorResponse),
        (status = 502, description = "AI backend failed", body = ErrorResponse)
    ),
    tag = "workflows"
)]
pub async fn x_post_generate(
    State(state): State<ProxyState>,
    user: AuthUser,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, ApiError> {
    forward(&state, Workflow::XPostGenerate, &user, body).await
}

/// POST /api/x-post/ideas - Suggest X post ideas for keywords
#[utoipa::path(
    post,
    path = "/api/x-post/ideas",
    request_body = Value,
    responses(
        (status = 200, description = "AI backend reply", body = Value),
        (status = 400, description = "Invalid keywords or count", body = ErrorResponse),
        (status = 502, description = "AI backend failed", body = ErrorResponse)
    ),
    tag = "workflows"
)]
pub async fn x_post_ideas(
    State(state): State<ProxyState>,
    user: AuthUser,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, ApiError> {
    forward(&state, Workflow::XPostIdeas, &user, body).await
}

/// POST /api/generate-visual-post - Generate a visual social post
#[utoipa::path(
    post,
    path = "/api/generate-visual-post",
    request_body = Value,
    responses(
        (status = 200, description = "AI backend reply", body = Value),
        (status = 502, description = "AI backend failed", body = ErrorResponse)
    ),
    tag = "workflows"
)]
pub async fn generate_visual_post(
    State(state): State<ProxyState>,
    user: AuthUser,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, ApiError> {
    forward(&state, Workflow::VisualPost, &user, body).await
}

/// POST /api/image-prompt - Turn a description into an image prompt
#[utoipa::path(
    post,
    path = "/api/image-prompt",
    request_body = Value,
    responses(
        (status = 200, description = "AI backend reply", body = Value),
        (status = 502, description = "AI backend failed", body = ErrorResponse)
    ),
    tag = "workflows"
)]
pub async fn image_prompt(
    State(state): State<ProxyState>,
    user: AuthUser,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, ApiError> {
    forward(&state, Workflow::ImagePrompt, &user, body).await
}
