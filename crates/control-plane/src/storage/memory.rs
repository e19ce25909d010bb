// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// Mirrors the PostgreSQL repositories, including the unique constraints on
// users.email and x_credentials.user_id, so the server runs without a database.

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::models::*;

/// In-memory database for dev mode
/// All data is stored in memory and lost on restart
#[derive(Default)]
pub struct InMemoryDatabase {
    users: RwLock<HashMap<Uuid, UserRow>>,
    // Keyed by user_id: at most one row per user
    x_credentials: RwLock<HashMap<Uuid, XCredentialRow>>,
    generated_images: RwLock<HashMap<Uuid, GeneratedImageRow>>,
    generated_audio: RwLock<HashMap<Uuid, GeneratedAudioRow>>,
    saved_articles: RwLock<HashMap<Uuid, SavedArticleRow>>,
    // Fault injection for generated-content inserts
    fail_content_writes: AtomicBool,
}

/// Newest first, id as tiebreaker.
fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    /// While set, inserts of images, audio and saved articles fail.
    pub fn set_fail_content_writes(&self, fail: bool) {
        self.fail_content_writes.store(fail, Ordering::SeqCst);
    }

    fn check_content_writable(&self) -> Result<()> {
        if self.fail_content_writes.load(Ordering::SeqCst) {
            anyhow::bail!("content writes are disabled");
        }
        Ok(())
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email == input.email) {
            return Err(UniqueViolation::new("users_email_key").into());
        }

        let now = Self::now();
        let row = UserRow {
            id: Uuid::now_v7(),
            username: input.username,
            email: input.email,
            password_hash: input.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    // ============================================
    // X credentials
    // ============================================

    pub async fn upsert_x_credential(&self, input: UpsertXCredentialRow) -> Result<XCredentialRow> {
        let now = Self::now();
        let mut credentials = self.x_credentials.write();
        let row = match credentials.get_mut(&input.user_id) {
            Some(existing) => {
                existing.api_key_encrypted = input.api_key_encrypted;
                existing.api_secret_encrypted = input.api_secret_encrypted;
                existing.bearer_token = input.bearer_token;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let row = XCredentialRow {
                    id: Uuid::now_v7(),
                    user_id: input.user_id,
                    api_key_encrypted: input.api_key_encrypted,
                    api_secret_encrypted: input.api_secret_encrypted,
                    bearer_token: input.bearer_token,
                    created_at: now,
                    updated_at: now,
                };
                credentials.insert(input.user_id, row.clone());
                row
            }
        };
        Ok(row)
    }

    pub async fn get_x_credential(&self, user_id: Uuid) -> Result<Option<XCredentialRow>> {
        Ok(self.x_credentials.read().get(&user_id).cloned())
    }

    pub async fn has_x_credential(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.x_credentials.read().contains_key(&user_id))
    }

    pub async fn delete_x_credential(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.x_credentials.write().remove(&user_id).is_some())
    }

    // ============================================
    // Generated images
    // ============================================

    pub async fn create_generated_image(
        &self,
        input: CreateGeneratedImageRow,
    ) -> Result<GeneratedImageRow> {
        self.check_content_writable()?;
        let row = GeneratedImageRow {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            prompt: input.prompt,
            file_key: input.file_key,
            image_url: input.image_url,
            created_at: Self::now(),
        };
        self.generated_images.write().insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn list_generated_images(&self, user_id: Uuid) -> Result<Vec<GeneratedImageRow>> {
        let mut rows: Vec<_> = self
            .generated_images
            .read()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |r| (r.created_at, r.id));
        Ok(rows)
    }

    pub async fn delete_generated_image(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut images = self.generated_images.write();
        if images.get(&id).is_some_and(|r| r.user_id == user_id) {
            images.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    // ============================================
    // Generated audio
    // ============================================

    pub async fn create_generated_audio(
        &self,
        input: CreateGeneratedAudioRow,
    ) -> Result<GeneratedAudioRow> {
        self.check_content_writable()?;
        let row = GeneratedAudioRow {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            text: input.text,
            description: input.description,
            voice_label: input.voice_label,
            audio_url: input.audio_url,
            created_at: Self::now(),
        };
        self.generated_audio.write().insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn list_generated_audio(&self, user_id: Uuid) -> Result<Vec<GeneratedAudioRow>> {
        let mut rows: Vec<_> = self
            .generated_audio
            .read()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |r| (r.created_at, r.id));
        Ok(rows)
    }

    pub async fn delete_generated_audio(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut audio = self.generated_audio.write();
        if audio.get(&id).is_some_and(|r| r.user_id == user_id) {
            audio.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    // ============================================
    // Saved articles
    // ============================================

    pub async fn create_saved_article(
        &self,
        input: CreateSavedArticleRow,
    ) -> Result<SavedArticleRow> {
        self.check_content_writable()?;
        let row = SavedArticleRow {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            kind: input.kind,
            thread_id: input.thread_id,
            username: input.username,
            result: input.result,
            url: input.url,
            created_at: Self::now(),
        };
        self.saved_articles.write().insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn list_saved_articles(
        &self,
        user_id: Uuid,
        kind: Option<&str>,
    ) -> Result<Vec<SavedArticleRow>> {
        let mut rows: Vec<_> = self
            .saved_articles
            .read()
            .values()
            .filter(|r| r.user_id == user_id && kind.map_or(true, |k| r.kind == k))
            .cloned()
            .collect();
        newest_first(&mut rows, |r| (r.created_at, r.id));
        Ok(rows)
    }

    pub async fn delete_saved_article(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut articles = self.saved_articles.write();
        if articles.get(&id).is_some_and(|r| r.user_id == user_id) {
            articles.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
