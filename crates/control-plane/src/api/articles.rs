// Saved article HTTP routes (newsroom articles and blogs)

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use contentdesk_upstream::ArticleKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::common::{ErrorResponse, IdQuery, StatusResponse};
use super::validation::{check_max_bytes, non_blank, MAX_ARTICLE_RESULT_BYTES};
use crate::auth::{AuthState, AuthUser, FromRef};
use crate::error::{ApiError, ApiJson, ApiQuery};
use crate::services::ArticleService;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedArticle {
    pub id: Uuid,
    /// `news` or `blog`
    #[schema(example = "news")]
    pub kind: String,
    /// AI backend workflow thread that produced the text
    pub thread_id: String,
    pub username: String,
    pub result: String,
    /// Source URL, empty when there is none
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveArticleRequest {
    #[schema(example = "thread_01J9Z")]
    pub thread_id: Option<String>,
    pub result: Option<String>,
    #[schema(example = "https://news.example.com/story")]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ArticlesQuery {
    /// Filter by kind: `news` or `blog`
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavedArticleResponse {
    #[schema(example = "success")]
    pub status: String,
    pub saved: SavedArticle,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticlesResponse {
    pub articles: Vec<SavedArticle>,
}

#[derive(Clone)]
pub struct ArticlesState {
    pub service: Arc<ArticleService>,
    pub auth: AuthState,
}

impl FromRef<ArticlesState> for AuthState {
    fn from_ref(input: &ArticlesState) -> Self {
        input.auth.clone()
    }
}

pub fn routes(state: ArticlesState) -> Router {
    Router::new()
        .route("/api/save-news-article", post(save_news_article))
        .route("/api/save-blog", post(save_blog))
        .route(
            "/api/saved-articles",
            get(list_articles).delete(delete_article),
        )
        .with_state(state)
}

/// POST /api/save-news-article - Save a newsroom article
#[utoipa::path(
    post,
    path = "/api/save-news-article",
    request_body = SaveArticleRequest,
    responses(
        (status = 200, description = "Article saved", body = SavedArticleResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "articles"
)]
pub async fn save_news_article(
    State(state): State<ArticlesState>,
    user: AuthUser,
    ApiJson(req): ApiJson<SaveArticleRequest>,
) -> Result<Json<SavedArticleResponse>, ApiError> {
    save(&state, &user, ArticleKind::News, req).await
}

/// POST /api/save-blog - Save a blog post
#[utoipa::path(
    post,
    path = "/api/save-blog",
    request_body = SaveArticleRequest,
    responses(
        (status = 200, description = "Blog saved", body = SavedArticleResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "articles"
)]
pub async fn save_blog(
    State(state): State<ArticlesState>,
    user: AuthUser,
    ApiJson(req): ApiJson<SaveArticleRequest>,
) -> Result<Json<SavedArticleResponse>, ApiError> {
    save(&state, &user, ArticleKind::Blog, req).await
}

async fn save(
    state: &ArticlesState,
    user: &AuthUser,
    kind: ArticleKind,
    req: SaveArticleRequest,
) -> Result<Json<SavedArticleResponse>, ApiError> {
    let (Some(thread_id), Some(result)) = (
        non_blank(req.thread_id.as_deref()),
        non_blank(req.result.as_deref()),
    ) else {
        return Err(ApiError::validation("Missing fields"));
    };
    check_max_bytes(result, MAX_ARTICLE_RESULT_BYTES, "Article result")?;
    let url = non_blank(req.url.as_deref()).unwrap_or_default();

    let saved = state
        .service
        .save(user.id, &user.username, kind, thread_id, result, url)
        .await?;
    Ok(Json(SavedArticleResponse {
        status: "success".to_string(),
        saved,
    }))
}

/// GET /api/saved-articles - List the caller's saved articles, newest first
#[utoipa::path(
    get,
    path = "/api/saved-articles",
    params(ArticlesQuery),
    responses(
        (status = 200, description = "Saved articles", body = ArticlesResponse),
        (status = 400, description = "Unknown kind", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "articles"
)]
pub async fn list_articles(
    State(state): State<ArticlesState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ArticlesQuery>,
) -> Result<Json<ArticlesResponse>, ApiError> {
    let kind = match non_blank(query.kind.as_deref()) {
        Some(raw) => Some(
            raw.parse::<ArticleKind>()
                .map_err(|_| ApiError::validation("Kind must be news or blog"))?,
        ),
        None => None,
    };

    let articles = state.service.list(user.id, kind).await?;
    Ok(Json(ArticlesResponse { articles }))
}

/// DELETE /api/saved-articles?id= - Delete one of the caller's saved articles
#[utoipa::path(
    delete,
    path = "/api/saved-articles",
    params(IdQuery),
    responses(
        (status = 200, description = "Article deleted", body = StatusResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    tag = "articles"
)]
pub async fn delete_article(
    State(state): State<ArticlesState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = query.parse()?;
    if !state.service.delete(user.id, id).await? {
        return Err(ApiError::not_found());
    }
    Ok(Json(StatusResponse::deleted()))
}
