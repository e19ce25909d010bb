// Application configuration
//
// Read once at startup from the process environment. Every section is built from a
// variable lookup so tests can supply their own values without touching the environment.

use anyhow::{Context, Result};
use contentdesk_upstream::{UpstreamConfig, DEFAULT_TIMEOUT};
use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::AuthConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";

/// Secrets encryption keys (`key_id:base64(32 bytes)`).
#[derive(Debug, Clone, Default)]
pub struct EncryptionConfig {
    /// Key used for new ciphertexts. The credential vault is disabled without it.
    pub primary_key: Option<String>,
    /// Keys that may still decrypt older ciphertexts.
    pub previous_keys: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// PostgreSQL URL; `None` selects in-memory dev storage
    pub database_url: Option<String>,
    /// Prefix nesting every API route, e.g. `/dashboard`
    pub api_prefix: String,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
    pub upstream: UpstreamConfig,
    pub encryption: EncryptionConfig,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn comma_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = non_empty(get("BIND_ADDR"))
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:9000")?;

        let timeout = match non_empty(get("UPSTREAM_TIMEOUT_SECS")) {
            Some(secs) => Duration::from_secs(
                secs.parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .context("UPSTREAM_TIMEOUT_SECS must be a positive number of seconds")?,
            ),
            None => DEFAULT_TIMEOUT,
        };

        let api_prefix = non_empty(get("API_PREFIX"))
            .map(|p| p.trim_end_matches('/').to_string())
            .unwrap_or_default();
        anyhow::ensure!(
            api_prefix.is_empty() || api_prefix.starts_with('/'),
            "API_PREFIX must start with '/', got {:?}",
            api_prefix
        );

        Ok(Self {
            bind_addr,
            database_url: non_empty(get("DATABASE_URL")),
            api_prefix,
            cors_origins: comma_list(get("CORS_ALLOWED_ORIGINS")),
            auth: AuthConfig::from_lookup(&get),
            upstream: UpstreamConfig {
                ai_backend_url: non_empty(get("AI_BACKEND_URL")),
                tts_endpoint: non_empty(get("TTS_ENDPOINT")),
                image_endpoint: non_empty(get("IMAGE_ENDPOINT")),
                timeout,
            },
            encryption: EncryptionConfig {
                primary_key: non_empty(get("SECRETS_ENCRYPTION_KEY")),
                previous_keys: comma_list(get("SECRETS_ENCRYPTION_KEY_PREVIOUS")),
            },
        })
    }
}
