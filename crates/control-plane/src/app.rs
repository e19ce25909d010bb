// Router assembly
// Decision: Everything a handler needs is built once and injected through per-module state
// Decision: /health stays at the root; API routes are nested under the optional prefix

use axum::{extract::State, routing::get, Json, Router};
use contentdesk_upstream::UpstreamClient;
use serde::Serialize;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::auth::{self, AuthConfig, AuthState};
use crate::openapi::ApiDoc;
use crate::services::{
    ArticleService, AudioService, CredentialVault, ImageService, WorkflowService,
};
use crate::storage::{SecretCipher, StorageBackend};

/// Process-wide dependencies shared by every route.
#[derive(Clone)]
pub struct AppContext {
    pub db: Arc<StorageBackend>,
    pub auth: AuthState,
    pub upstream: UpstreamClient,
    /// `None` disables the credential vault
    pub cipher: Option<Arc<dyn SecretCipher>>,
}

impl AppContext {
    pub fn new(
        db: Arc<StorageBackend>,
        auth_config: AuthConfig,
        upstream: UpstreamClient,
        cipher: Option<Arc<dyn SecretCipher>>,
    ) -> Self {
        let auth = AuthState::new(auth_config, db.clone());
        Self {
            db,
            auth,
            upstream,
            cipher,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage: &'static str,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    storage: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
    })
}

/// Every API route, unprefixed.
pub fn api_routes(ctx: &AppContext) -> Router {
    let articles = Arc::new(ArticleService::new(ctx.db.clone()));

    let images_state = api::generated_images::ImagesState {
        service: Arc::new(ImageService::new(ctx.db.clone(), ctx.upstream.clone())),
        auth: ctx.auth.clone(),
    };
    let audio_state = api::generated_audio::AudioState {
        service: Arc::new(AudioService::new(ctx.db.clone(), ctx.upstream.clone())),
        auth: ctx.auth.clone(),
    };
    let articles_state = api::articles::ArticlesState {
        service: articles.clone(),
        auth: ctx.auth.clone(),
    };
    let x_state = api::x_credentials::XState {
        vault: Arc::new(CredentialVault::new(ctx.db.clone(), ctx.cipher.clone())),
        auth: ctx.auth.clone(),
    };
    let proxy_state = api::proxy::ProxyState {
        service: Arc::new(WorkflowService::new(ctx.upstream.clone(), articles)),
        auth: ctx.auth.clone(),
    };

    Router::new()
        .merge(auth::routes(ctx.auth.clone()))
        .merge(api::generated_images::routes(images_state))
        .merge(api::generated_audio::routes(audio_state))
        .merge(api::articles::routes(articles_state))
        .merge(api::x_credentials::routes(x_state))
        .merge(api::proxy::routes(proxy_state))
}

/// Health, prefixed API routes and API docs. Transport layers (CORS, tracing) are added by the caller.
pub fn build_router(ctx: &AppContext, api_prefix: &str) -> Router {
    let health_state = HealthState {
        storage: ctx.db.kind(),
    };

    Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(build_router_with_prefix(api_routes(ctx), api_prefix))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
}

/// Build router with optional API prefix
pub fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}
