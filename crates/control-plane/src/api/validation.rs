// Input validation for API request bodies
//
// Field checks return the client-facing message as an ApiError::Validation.
// Size limits are last-resort guards, not configurable.

use crate::error::ApiError;

// =============================================================================
// Limits
// =============================================================================

/// Maximum TTS input, counted in Unicode scalar values.
pub const MAX_TTS_TEXT_CHARS: usize = 400;

/// Maximum size for a saved article body. 1 MB fits any generated article.
pub const MAX_ARTICLE_RESULT_BYTES: usize = 1024 * 1024;

/// Maximum size for an image prompt.
pub const MAX_PROMPT_BYTES: usize = 10 * 1024;

/// Generic message for size-limit violations.
pub const LIMIT_EXCEEDED_MESSAGE: &str = "Input exceeds allowed limits";

// =============================================================================
// Validation Functions
// =============================================================================

/// Trimmed value if present and non-blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Untrimmed value if present and non-blank.
pub fn provided(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Trimmed value or a 400 with `message`.
pub fn require<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, ApiError> {
    non_blank(value).ok_or_else(|| ApiError::validation(message))
}

pub fn check_max_bytes(value: &str, max: usize, field: &str) -> Result<(), ApiError> {
    if value.len() > max {
        tracing::warn!(
            "{} exceeds limit: {} bytes (max: {})",
            field,
            value.len(),
            max
        );
        return Err(ApiError::validation(LIMIT_EXCEEDED_MESSAGE));
    }
    Ok(())
}

/// Trimmed TTS text, 1..=400 characters.
pub fn validate_tts_text(text: Option<&str>) -> Result<&str, ApiError> {
    let text = require(text, "Text is required")?;
    if text.chars().count() > MAX_TTS_TEXT_CHARS {
        return Err(ApiError::validation(format!(
            "Text must be {} characters or less",
            MAX_TTS_TEXT_CHARS
        )));
    }
    Ok(text)
}

pub fn validate_voice_description(description: Option<&str>) -> Result<&str, ApiError> {
    require(description, "Voice description is required")
}
