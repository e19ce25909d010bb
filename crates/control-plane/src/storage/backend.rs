// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// This module provides a unified StorageBackend enum that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

use super::memory::InMemoryDatabase;
use super::models::*;
use super::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Connect to PostgreSQL and apply pending migrations
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        db.migrate().await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryDatabase::new()))
    }

    /// Short backend name for health output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::InMemory(_) => "memory",
        }
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        match self {
            Self::Postgres(db) => db.create_user(input).await,
            Self::InMemory(db) => db.create_user(input).await,
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user_by_email(email).await,
            Self::InMemory(db) => db.get_user_by_email(email).await,
        }
    }

    // ============================================
    // X credentials
    // ============================================

    pub async fn upsert_x_credential(&self, input: UpsertXCredentialRow) -> Result<XCredentialRow> {
        match self {
            Self::Postgres(db) => db.upsert_x_credential(input).await,
            Self::InMemory(db) => db.upsert_x_credential(input).await,
        }
    }

    pub async fn get_x_credential(&self, user_id: Uuid) -> Result<Option<XCredentialRow>> {
        match self {
            Self::Postgres(db) => db.get_x_credential(user_id).await,
            Self::InMemory(db) => db.get_x_credential(user_id).await,
        }
    }

    pub async fn has_x_credential(&self, user_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.has_x_credential(user_id).await,
            Self::InMemory(db) => db.has_x_credential(user_id).await,
        }
    }

    pub async fn delete_x_credential(&self, user_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_x_credential(user_id).await,
            Self::InMemory(db) => db.delete_x_credential(user_id).await,
        }
    }

    // ============================================
    // Generated images
    // ============================================

    pub async fn create_generated_image(
        &self,
        input: CreateGeneratedImageRow,
    ) -> Result<GeneratedImageRow> {
        match self {
            Self::Postgres(db) => db.create_generated_image(input).await,
            Self::InMemory(db) => db.create_generated_image(input).await,
        }
    }

    pub async fn list_generated_images(&self, user_id: Uuid) -> Result<Vec<GeneratedImageRow>> {
        match self {
            Self::Postgres(db) => db.list_generated_images(user_id).await,
            Self::InMemory(db) => db.list_generated_images(user_id).await,
        }
    }

    pub async fn delete_generated_image(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_generated_image(id, user_id).await,
            Self::InMemory(db) => db.delete_generated_image(id, user_id).await,
        }
    }

    // ============================================
    // Generated audio
    // ============================================

    pub async fn create_generated_audio(
        &self,
        input: CreateGeneratedAudioRow,
    ) -> Result<GeneratedAudioRow> {
        match self {
            Self::Postgres(db) => db.create_generated_audio(input).await,
            Self::InMemory(db) => db.create_generated_audio(input).await,
        }
    }

    pub async fn list_generated_audio(&self, user_id: Uuid) -> Result<Vec<GeneratedAudioRow>> {
        match self {
            Self::Postgres(db) => db.list_generated_audio(user_id).await,
            Self::InMemory(db) => db.list_generated_audio(user_id).await,
        }
    }

    pub async fn delete_generated_audio(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_generated_audio(id, user_id).await,
            Self::InMemory(db) => db.delete_generated_audio(id, user_id).await,
        }
    }

    // ============================================
    // Saved articles
    // ============================================

    pub async fn create_saved_article(
        &self,
        input: CreateSavedArticleRow,
    ) -> Result<SavedArticleRow> {
        match self {
            Self::Postgres(db) => db.create_saved_article(input).await,
            Self::InMemory(db) => db.create_saved_article(input).await,
        }
    }

    pub async fn list_saved_articles(
        &self,
        user_id: Uuid,
        kind: Option<&str>,
    ) -> Result<Vec<SavedArticleRow>> {
        match self {
            Self::Postgres(db) => db.list_saved_articles(user_id, kind).await,
            Self::InMemory(db) => db.list_saved_articles(user_id, kind).await,
        }
    }

    pub async fn delete_saved_article(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_saved_article(id, user_id).await,
            Self::InMemory(db) => db.delete_saved_article(id, user_id).await,
        }
    }
}
