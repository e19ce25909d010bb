// ContentDesk API server
// Decision: Without DATABASE_URL the server runs on in-memory storage (dev mode)
// Decision: A missing encryption key disables the credential vault instead of failing startup

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use contentdesk_control_plane::storage::{EncryptionService, SecretCipher, StorageBackend};
use contentdesk_control_plane::telemetry::{init_tracing, TelemetryConfig};
use contentdesk_control_plane::{build_router, AppConfig, AppContext};
use contentdesk_upstream::{Service, UpstreamClient};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; real environment variables win
    let _ = dotenvy::dotenv();

    let mut telemetry_config = TelemetryConfig::from_env();
    telemetry_config.service_version = Some(env!("CARGO_PKG_VERSION").to_string());
    init_tracing(&telemetry_config);

    tracing::info!("contentdesk-control-plane starting...");

    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Initialize storage
    let db = match &config.database_url {
        Some(url) => {
            let db = StorageBackend::postgres(url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database, migrations applied");
            db
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is lost on exit)");
            StorageBackend::in_memory()
        }
    };
    let db = Arc::new(db);

    // Initialize encryption service for X credentials (optional - gracefully degrade if not configured)
    let cipher: Option<Arc<dyn SecretCipher>> = match &config.encryption.primary_key {
        Some(primary) => {
            let previous: Vec<&str> = config
                .encryption
                .previous_keys
                .iter()
                .map(String::as_str)
                .collect();
            match EncryptionService::new(primary, &previous) {
                Ok(svc) => {
                    tracing::info!(
                        key_id = svc.primary_key_id(),
                        "Encryption service initialized for credential storage"
                    );
                    Some(Arc::new(svc) as Arc<dyn SecretCipher>)
                }
                Err(e) => {
                    tracing::warn!("Invalid SECRETS_ENCRYPTION_KEY: {:#}. Credential storage disabled.", e);
                    None
                }
            }
        }
        None => {
            tracing::warn!("SECRETS_ENCRYPTION_KEY not set. Credential storage disabled.");
            None
        }
    };

    let upstream =
        UpstreamClient::new(config.upstream.clone()).context("Failed to build upstream client")?;
    for service in [
        Service::AiBackend,
        Service::TextToSpeech,
        Service::ImageGeneration,
    ] {
        if !upstream.is_configured(service) {
            tracing::warn!(service = %service, "Upstream endpoint not configured");
        }
    }
    tracing::info!(
        timeout_secs = config.upstream.timeout.as_secs(),
        cookie_secure = config.auth.cookie_secure,
        "Upstream and session settings loaded"
    );

    if !config.api_prefix.is_empty() {
        tracing::info!(prefix = %config.api_prefix, "API prefix configured");
    }

    let ctx = AppContext::new(db, config.auth.clone(), upstream, cipher);
    let app = build_router(&ctx, &config.api_prefix);

    // CORS is only needed when the dashboard is served from a different origin
    let cors_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let app = if !cors_origins.is_empty() {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    header::ORIGIN,
                    header::CACHE_CONTROL,
                ])
                .allow_credentials(true),
        )
    } else {
        tracing::info!("CORS not configured (same-origin requests only)");
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
