// Upstream HTTP client
//
// One shared reqwest::Client for the AI backend, the TTS endpoint and the image endpoint.
// Every call is a single JSON POST with the configured timeout. No retries.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::error::{extract_error_message, UpstreamError};
use crate::response::{AudioResponse, ImageResponse};

/// Default outbound timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// External service an [`UpstreamClient`] call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    AiBackend,
    TextToSpeech,
    ImageGeneration,
}

impl Service {
    /// Name used in client-facing messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Service::AiBackend => "AI backend",
            Service::TextToSpeech => "TTS",
            Service::ImageGeneration => "Image",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Endpoints and timeout for the upstream services.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the AI backend; workflow paths are appended to it.
    pub ai_backend_url: Option<String>,
    /// Full URL of the text-to-speech endpoint.
    pub tts_endpoint: Option<String>,
    /// Full URL of the image generation endpoint.
    pub image_endpoint: Option<String>,
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            ai_backend_url: None,
            tts_endpoint: None,
            image_endpoint: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Request body sent to the TTS endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest<'a> {
    pub text: &'a str,
    pub description: &'a str,
}

/// Request body sent to the image endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRequest<'a> {
    pub prompt: &'a str,
}

#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build upstream HTTP client")?;
        Ok(Self { http, config })
    }

    pub fn is_configured(&self, service: Service) -> bool {
        self.endpoint(service).is_some()
    }

    fn endpoint(&self, service: Service) -> Option<&str> {
        let endpoint = match service {
            Service::AiBackend => self.config.ai_backend_url.as_deref(),
            Service::TextToSpeech => self.config.tts_endpoint.as_deref(),
            Service::ImageGeneration => self.config.image_endpoint.as_deref(),
        };
        endpoint.filter(|url| !url.trim().is_empty())
    }

    /// POST a JSON body to an AI backend workflow (`path` is appended to the base URL)
    /// and return the upstream JSON unchanged.
    pub async fn run_workflow(&self, path: &str, body: &Value) -> Result<Value, UpstreamError> {
        let base = self
            .endpoint(Service::AiBackend)
            .ok_or(UpstreamError::NotConfigured(Service::AiBackend))?;
        let url = join_url(base, path);
        self.post_json(Service::AiBackend, &url, body).await
    }

    /// Synthesize speech and return the generated audio URL.
    pub async fn synthesize_speech(
        &self,
        request: &SpeechRequest<'_>,
    ) -> Result<AudioResponse, UpstreamError> {
        let url = self
            .endpoint(Service::TextToSpeech)
            .ok_or(UpstreamError::NotConfigured(Service::TextToSpeech))?
            .to_string();
        let value = self.post_json(Service::TextToSpeech, &url, request).await?;
        AudioResponse::from_value(&value)
    }

    /// Generate an image and return its public URL and storage key.
    pub async fn generate_image(
        &self,
        request: &ImageRequest<'_>,
    ) -> Result<ImageResponse, UpstreamError> {
        let url = self
            .endpoint(Service::ImageGeneration)
            .ok_or(UpstreamError::NotConfigured(Service::ImageGeneration))?
            .to_string();
        let value = self
            .post_json(Service::ImageGeneration, &url, request)
            .await?;
        ImageResponse::from_value(&value)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        service: Service,
        url: &str,
        body: &B,
    ) -> Result<Value, UpstreamError> {
        tracing::debug!(service = %service, url = %url, "Calling upstream");

        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| {
                tracing::warn!(service = %service, error = %source, "Upstream unreachable");
                UpstreamError::Unreachable { service, source }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(status, &body);
            tracing::warn!(
                service = %service,
                status = status.as_u16(),
                message = %message,
                "Upstream returned an error"
            );
            return Err(UpstreamError::Status { status, message });
        }

        // A failed body read counts as unreachable
        let bytes = response.bytes().await.map_err(|source| {
            tracing::warn!(service = %service, error = %source, "Upstream body read failed");
            UpstreamError::Unreachable { service, source }
        })?;
        serde_json::from_slice::<Value>(&bytes).map_err(|e| {
            tracing::warn!(service = %service, error = %e, "Upstream body is not JSON");
            UpstreamError::InvalidResponse(format!("Invalid response from {} service", service))
        })
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
