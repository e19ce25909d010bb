// Generated image HTTP routes

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{ErrorResponse, IdQuery, StatusResponse};
use super::validation::{check_max_bytes, non_blank, require, MAX_PROMPT_BYTES};
use crate::auth::{AuthState, AuthUser, FromRef};
use crate::error::{ApiError, ApiJson, ApiQuery};
use crate::services::ImageService;

/// A stored generated image.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: Uuid,
    pub prompt: String,
    /// Storage key on the image server.
    pub file_key: String,
    /// Public URL of the image.
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// A freshly generated image (recorded in the background).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImagePreview {
    pub prompt: String,
    pub file_key: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGeneratedImageRequest {
    #[schema(example = "A lighthouse at dawn, watercolor")]
    pub prompt: Option<String>,
    #[schema(example = "images/5f1c.png")]
    pub file_key: Option<String>,
    #[schema(example = "https://images.example.com/5f1c.png")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GenerateImageRequest {
    #[schema(example = "A lighthouse at dawn, watercolor")]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImagesResponse {
    pub images: Vec<GeneratedImage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedImageResponse {
    #[schema(example = "success")]
    pub status: String,
    pub image: GeneratedImage,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateImageResponse {
    pub image: GeneratedImagePreview,
}

#[derive(Clone)]
pub struct ImagesState {
    pub service: Arc<ImageService>,
    pub auth: AuthState,
}

impl FromRef<ImagesState> for AuthState {
    fn from_ref(input: &ImagesState) -> Self {
        input.auth.clone()
    }
}

pub fn routes(state: ImagesState) -> Router {
    Router::new()
        .route(
            "/api/generated-images",
            get(list_images).post(create_image).delete(delete_image),
        )
        .route("/api/generate-image", post(generate_image))
        .with_state(state)
}

/// GET /api/generated-images - List the caller's images, newest first
#[utoipa::path(
    get,
    path = "/api/generated-images",
    responses(
        (status = 200, description = "Images of the current user", body = ImagesResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "images"
)]
pub async fn list_images(
    State(state): State<ImagesState>,
    user: AuthUser,
) -> Result<Json<ImagesResponse>, ApiError> {
    let images = state.service.list(user.id).await?;
    Ok(Json(ImagesResponse { images }))
}

/// POST /api/generated-images - Record an image produced by the image server
#[utoipa::path(
    post,
    path = "/api/generated-images",
    request_body = CreateGeneratedImageRequest,
    responses(
        (status = 200, description = "Image recorded", body = CreatedImageResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "images"
)]
pub async fn create_image(
    State(state): State<ImagesState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateGeneratedImageRequest>,
) -> Result<Json<CreatedImageResponse>, ApiError> {
    let (Some(prompt), Some(file_key), Some(image_url)) = (
        non_blank(req.prompt.as_deref()),
        non_blank(req.file_key.as_deref()),
        non_blank(req.image_url.as_deref()),
    ) else {
        return Err(ApiError::validation("Missing prompt, fileKey, or imageUrl"));
    };
    check_max_bytes(prompt, MAX_PROMPT_BYTES, "Image prompt")?;

    let image = state
        .service
        .create(user.id, prompt, file_key, image_url)
        .await?;
    Ok(Json(CreatedImageResponse {
        status: "success".to_string(),
        image,
    }))
}

/// DELETE /api/generated-images?id= - Delete one of the caller's images
#[utoipa::path(
    delete,
    path = "/api/generated-images",
    params(IdQuery),
    responses(
        (status = 200, description = "Image deleted", body = StatusResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    tag = "images"
)]
pub async fn delete_image(
    State(state): State<ImagesState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = query.parse()?;
    if !state.service.delete(user.id, id).await? {
        return Err(ApiError::not_found());
    }
    Ok(Json(StatusResponse::deleted()))
}

/// POST /api/generate-image - Generate an image from a prompt
#[utoipa::path(
    post,
    path = "/api/generate-image",
    request_body = GenerateImageRequest,
    responses(
        (status = 200, description = "Image generated", body = GenerateImageResponse),
        (status = 400, description = "Prompt missing", body = ErrorResponse),
        (status = 502, description = "Image service failed", body = ErrorResponse)
    ),
    tag = "images"
)]
pub async fn generate_image(
    State(state): State<ImagesState>,
    user: AuthUser,
    ApiJson(req): ApiJson<GenerateImageRequest>,
) -> Result<Json<GenerateImageResponse>, ApiError> {
    let prompt = require(req.prompt.as_deref(), "Prompt is required")?;
    check_max_bytes(prompt, MAX_PROMPT_BYTES, "Image prompt")?;

    let image = state.service.generate(user.id, prompt).await?;
    Ok(Json(GenerateImageResponse { image }))
}
