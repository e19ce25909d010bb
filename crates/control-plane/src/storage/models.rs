// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

// ============================================
// Users
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUserRow {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

// ============================================
// X credentials
// ============================================

/// One row per user. Key and secret hold encrypted payloads, never plaintext.
#[derive(Debug, Clone, FromRow)]
pub struct XCredentialRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub api_key_encrypted: Vec<u8>,
    pub api_secret_encrypted: Vec<u8>,
    pub bearer_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UpsertXCredentialRow {
    pub user_id: Uuid,
    pub api_key_encrypted: Vec<u8>,
    pub api_secret_encrypted: Vec<u8>,
    pub bearer_token: String,
}

// ============================================
// Generated media
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct GeneratedImageRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: String,
    pub file_key: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateGeneratedImageRow {
    pub user_id: Uuid,
    pub prompt: String,
    pub file_key: String,
    pub image_url: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct GeneratedAudioRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub description: String,
    pub voice_label: Option<String>,
    pub audio_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateGeneratedAudioRow {
    pub user_id: Uuid,
    pub text: String,
    pub description: String,
    pub voice_label: Option<String>,
    pub audio_url: String,
}

// ============================================
// Saved articles
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct SavedArticleRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub thread_id: String,
    pub username: String,
    pub result: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSavedArticleRow {
    pub user_id: Uuid,
    pub kind: String,
    pub thread_id: String,
    pub username: String,
    pub result: String,
    pub url: String,
}

// ============================================
// Errors
// ============================================

/// A unique constraint rejected the write. Returned inside `anyhow::Error`;
/// callers detect it with `downcast_ref`.
#[derive(Debug, Clone, Error)]
#[error("unique constraint violated: {constraint}")]
pub struct UniqueViolation {
    pub constraint: String,
}

impl UniqueViolation {
    pub fn new(constraint: impl Into<String>) -> Self {
        Self {
            constraint: constraint.into(),
        }
    }

    /// True when `err` (or anything in its chain) is a unique violation.
    pub fn is(err: &anyhow::Error) -> bool {
        err.chain()
            .any(|cause| cause.downcast_ref::<UniqueViolation>().is_some())
    }
}
