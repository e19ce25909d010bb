// OpenAPI documentification generation
//
// Shared by the API server (Swagger UI and /api-doc/openapi.json)
// and the export-openapi binary.

use crate::api;
use crate::auth;
use utoipa::OpenApi;

/// OpenAPI documentation for the ContentDesk API
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::routes::authenticate,
        auth::routes::logout,
        auth::routes::get_current_user,
        api::generated_images::list_images,
        api::generated_images::create_image,
        api::generated_images::delete_image,
        api::generated_images::generate_image,
        api::generated_audio::list_audio,
        api::generated_audio::text_to_audio,
        api::generated_audio::delete_audio,
        api::articles::save_news_article,
        api::articles::save_blog,
        api::articles::list_articles,
        api::articles::delete_article,
        api::x_credentials::get_status,
        api::x_credentials::save_credentials,
        api::x_credentials::remove_credentials,
        api::x_credentials::post_to_x,
        api::proxy::generate_blog,
        api::proxy::generate_news,
        api::proxy::repurpose_article,
        api::proxy::youtube_blog,
        api::proxy::x_post_generate,
        api::proxy::x_post_ideas,
        api::proxy::generate_visual_post,
        api::proxy::image_prompt,
    ),
    components(
        schemas(
            api::ErrorResponse,
            api::StatusResponse,
            // Auth types
            auth::routes::AuthRequest, auth::routes::AuthResponse, auth::routes::AuthUserSummary,
            auth::routes::MeResponse, auth::routes::CurrentUser, auth::routes::LogoutResponse,
            // Resource types
            api::generated_images::GeneratedImage, api::generated_images::GeneratedImagePreview,
            api::generated_images::CreateGeneratedImageRequest,
            api::generated_images::GenerateImageRequest,
            api::generated_images::ImagesResponse, api::generated_images::CreatedImageResponse,
            api::generated_images::GenerateImageResponse,
            api::generated_audio::GeneratedAudio, api::generated_audio::TextToAudioRequest,
            api::generated_audio::AudiosResponse, api::generated_audio::AudioResponse,
            api::articles::SavedArticle, api::articles::SaveArticleRequest,
            api::articles::SavedArticleResponse, api::articles::ArticlesResponse,
            // X types
            api::x_credentials::SaveXCredentialsRequest, api::x_credentials::ConnectionStatus,
            api::x_credentials::CredentialsChanged, api::x_credentials::XPostRequest,
            api::x_credentials::XPostResponse,
        )
    ),
    tags(
        (name = "auth", description = "Signup, login and session endpoints"),
        (name = "images", description = "Generated image endpoints"),
        (name = "audio", description = "Text-to-speech endpoints"),
        (name = "articles", description = "Saved article and blog endpoints"),
        (name = "x", description = "X credential and posting endpoints"),
        (name = "workflows", description = "AI backend workflow pass-through endpoints")
    ),
    info(
        title = "ContentDesk API",
        version = "0.1.0",
        description = "API for generating, storing and publishing marketing content",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI document as a pretty-printed JSON string
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}
