// Upstream response normalization
// Decision: Upstreams spell the same field several ways; each shape lists the spellings it accepts
// in priority order and fails with an "unrecognized upstream response" error otherwise

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::client::Service;
use crate::error::UpstreamError;

const AUDIO_URL_FIELDS: &[&str] = &["audio_url", "audioUrl"];
const IMAGE_URL_FIELDS: &[&str] = &["public_url", "publicUrl", "image_url", "imageUrl"];
const FILE_KEY_FIELDS: &[&str] = &["file_key", "fileKey"];
const THREAD_ID_FIELDS: &[&str] = &["threadId", "thread_id"];

/// First non-empty string found under any of `fields`.
fn first_string(value: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        value
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// TTS reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioResponse {
    pub audio_url: String,
}

impl AudioResponse {
    pub fn from_value(value: &Value) -> Result<Self, UpstreamError> {
        let audio_url = first_string(value, AUDIO_URL_FIELDS)
            .ok_or_else(|| UpstreamError::unrecognized(Service::TextToSpeech, "audio_url"))?;
        Ok(Self { audio_url })
    }
}

/// Image generation reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResponse {
    pub image_url: String,
    pub file_key: String,
}

impl ImageResponse {
    pub fn from_value(value: &Value) -> Result<Self, UpstreamError> {
        let image_url = first_string(value, IMAGE_URL_FIELDS)
            .ok_or_else(|| UpstreamError::unrecognized(Service::ImageGeneration, "public_url"))?;
        let file_key = first_string(value, FILE_KEY_FIELDS)
            .ok_or_else(|| UpstreamError::unrecognized(Service::ImageGeneration, "file_key"))?;
        Ok(Self {
            image_url,
            file_key,
        })
    }
}

/// Kind of long-form text an AI backend workflow produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleKind {
    Blog,
    News,
}

impl ArticleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleKind::Blog => "blog",
            ArticleKind::News => "news",
        }
    }

    fn text_fields(&self) -> &'static [&'static str] {
        match self {
            ArticleKind::Blog => &["generated_blog", "generatedBlog"],
            ArticleKind::News => &["generated_article", "generatedArticle"],
        }
    }
}

impl FromStr for ArticleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blog" => Ok(ArticleKind::Blog),
            "news" => Ok(ArticleKind::News),
            other => Err(format!("unknown article kind '{}'", other)),
        }
    }
}

impl fmt::Display for ArticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thread id plus generated text from a blog or news workflow reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArticle {
    pub thread_id: String,
    pub text: String,
}

impl GeneratedArticle {
    /// `None` when the reply does not carry both a thread id and the generated text.
    /// Workflows that are still waiting for human feedback reply without text.
    pub fn from_value(kind: ArticleKind, value: &Value) -> Option<Self> {
        Some(Self {
            thread_id: first_string(value, THREAD_ID_FIELDS)?,
            text: first_string(value, kind.text_fields())?,
        })
    }
}
