// ContentDesk upstream services
//
// Client for the external services the control plane proxies to:
// the AI backend workflows, the text-to-speech endpoint and the image endpoint.

mod client;
mod error;
mod response;

pub use client::{
    ImageRequest, Service, SpeechRequest, UpstreamClient, UpstreamConfig, DEFAULT_TIMEOUT,
};
pub use error::{extract_error_message, UpstreamError};
pub use response::{ArticleKind, AudioResponse, GeneratedArticle, ImageResponse};
