// Text-to-audio HTTP routes

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{ErrorResponse, IdQuery, StatusResponse};
use super::validation::{non_blank, validate_tts_text, validate_voice_description};
use crate::auth::{AuthState, AuthUser, FromRef};
use crate::error::{ApiError, ApiJson, ApiQuery};
use crate::services::AudioService;

/// Generated speech. `id` and `createdAt` are absent when the record could not be saved.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAudio {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub text: String,
    pub description: String,
    pub voice_label: Option<String>,
    pub audio_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextToAudioRequest {
    /// Up to 400 characters
    #[schema(example = "Welcome back to the weekly roundup.")]
    pub text: Option<String>,
    /// Free-form voice description passed to the TTS model
    #[schema(example = "A calm female voice with a slight British accent")]
    pub description: Option<String>,
    #[schema(example = "Narrator")]
    pub voice_label: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AudiosResponse {
    pub audios: Vec<GeneratedAudio>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AudioResponse {
    pub audio: GeneratedAudio,
}

#[derive(Clone)]
pub struct AudioState {
    pub service: Arc<AudioService>,
    pub auth: AuthState,
}

impl FromRef<AudioState> for AuthState {
    fn from_ref(input: &AudioState) -> Self {
        input.auth.clone()
    }
}

pub fn routes(state: AudioState) -> Router {
    Router::new()
        .route(
            "/api/text-to-audio",
            get(list_audio).post(text_to_audio).delete(delete_audio),
        )
        .with_state(state)
}

/// GET /api/text-to-audio - List the caller's audio, newest first
#[utoipa::path(
    get,
    path = "/api/text-to-audio",
    responses(
        (status = 200, description = "Audio of the current user", body = AudiosResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "audio"
)]
pub async fn list_audio(
    State(state): State<AudioState>,
    user: AuthUser,
) -> Result<Json<AudiosResponse>, ApiError> {
    let audios = state.service.list(user.id).await?;
    Ok(Json(AudiosResponse { audios }))
}

/// POST /api/text-to-audio - Synthesize speech and record it
#[utoipa::path(
    post,
    path = "/api/text-to-audio",
    request_body = TextToAudioRequest,
    responses(
        (status = 200, description = "Audio generated", body = AudioResponse),
        (status = 400, description = "Invalid text or description", body = ErrorResponse),
        (status = 500, description = "TTS endpoint not configured", body = ErrorResponse),
        (status = 502, description = "TTS service failed", body = ErrorResponse)
    ),
    tag = "audio"
)]
pub async fn text_to_audio(
    State(state): State<AudioState>,
    user: AuthUser,
    ApiJson(req): ApiJson<TextToAudioRequest>,
) -> Result<Json<AudioResponse>, ApiError> {
    // Nothing reaches the TTS service unless the input is valid
    let text = validate_tts_text(req.text.as_deref())?;
    let description = validate_voice_description(req.description.as_deref())?;
    let voice_label = non_blank(req.voice_label.as_deref());

    let audio = state
        .service
        .synthesize(user.id, text, description, voice_label)
        .await?;
    Ok(Json(AudioResponse { audio }))
}

/// DELETE /api/text-to-audio?id= - Delete one of the caller's audio records
#[utoipa::path(
    delete,
    path = "/api/text-to-audio",
    params(IdQuery),
    responses(
        (status = 200, description = "Audio deleted", body = StatusResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    tag = "audio"
)]
pub async fn delete_audio(
    State(state): State<AudioState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = query.parse()?;
    if !state.service.delete(user.id, id).await? {
        return Err(ApiError::not_found());
    }
    Ok(Json(StatusResponse::deleted()))
}
