// PostgreSQL repositories
// Decision: Ids are generated here as UUID v7 so both backends order rows the same way
// Decision: Every read/delete of user-owned rows filters by user_id in the same statement

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

/// Translate unique-constraint failures into [`UniqueViolation`].
fn map_unique(err: sqlx::Error) -> anyhow::Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return anyhow::Error::new(UniqueViolation::new(constraint));
        }
    }
    anyhow::Error::new(err)
}

impl Database {
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        Ok(Self { pool })
    }

    /// Apply pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique)?;

        Ok(row)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // X credentials
    // ============================================

    pub async fn upsert_x_credential(&self, input: UpsertXCredentialRow) -> Result<XCredentialRow> {
        let row = sqlx::query_as::<_, XCredentialRow>(
            r#"
            INSERT INTO x_credentials (id, user_id, api_key_encrypted, api_secret_encrypted, bearer_token)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET api_key_encrypted = EXCLUDED.api_key_encrypted,
                api_secret_encrypted = EXCLUDED.api_secret_encrypted,
                bearer_token = EXCLUDED.bearer_token,
                updated_at = NOW()
            RETURNING id, user_id, api_key_encrypted, api_secret_encrypted, bearer_token, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(&input.api_key_encrypted)
        .bind(&input.api_secret_encrypted)
        .bind(&input.bearer_token)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_x_credential(&self, user_id: Uuid) -> Result<Option<XCredentialRow>> {
        let row = sqlx::query_as::<_, XCredentialRow>(
            r#"
            SELECT id, user_id, api_key_encrypted, api_secret_encrypted, bearer_token, created_at, updated_at
            FROM x_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn has_x_credential(&self, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM x_credentials WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn delete_x_credential(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM x_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Page through every credential row, oldest first. Used by key rotation.
    pub async fn list_x_credentials(&self, limit: i64, offset: i64) -> Result<Vec<XCredentialRow>> {
        let rows = sqlx::query_as::<_, XCredentialRow>(
            r#"
            SELECT id, user_id, api_key_encrypted, api_secret_encrypted, bearer_token, created_at, updated_at
            FROM x_credentials
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_x_credential_ciphertexts(
        &self,
        id: Uuid,
        api_key_encrypted: &[u8],
        api_secret_encrypted: &[u8],
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE x_credentials
            SET api_key_encrypted = $2, api_secret_encrypted = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(api_key_encrypted)
        .bind(api_secret_encrypted)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Generated images
    // ============================================

    pub async fn create_generated_image(
        &self,
        input: CreateGeneratedImageRow,
    ) -> Result<GeneratedImageRow> {
        let row = sqlx::query_as::<_, GeneratedImageRow>(
            r#"
            INSERT INTO generated_images (id, user_id, prompt, file_key, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, prompt, file_key, image_url, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(&input.prompt)
        .bind(&input.file_key)
        .bind(&input.image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_generated_images(&self, user_id: Uuid) -> Result<Vec<GeneratedImageRow>> {
        let rows = sqlx::query_as::<_, GeneratedImageRow>(
            r#"
            SELECT id, user_id, prompt, file_key, image_url, created_at
            FROM generated_images
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn delete_generated_image(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM generated_images
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Generated audio
    // ============================================

    pub async fn create_generated_audio(
        &self,
        input: CreateGeneratedAudioRow,
    ) -> Result<GeneratedAudioRow> {
        let row = sqlx::query_as::<_, GeneratedAudioRow>(
            r#"
            INSERT INTO generated_audio (id, user_id, text, description, voice_label, audio_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, text, description, voice_label, audio_url, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(&input.text)
        .bind(&input.description)
        .bind(&input.voice_label)
        .bind(&input.audio_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_generated_audio(&self, user_id: Uuid) -> Result<Vec<GeneratedAudioRow>> {
        let rows = sqlx::query_as::<_, GeneratedAudioRow>(
            r#"
            SELECT id, user_id, text, description, voice_label, audio_url, created_at
            FROM generated_audio
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn delete_generated_audio(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM generated_audio
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Saved articles
    // ============================================

    pub async fn create_saved_article(
        &self,
        input: CreateSavedArticleRow,
    ) -> Result<SavedArticleRow> {
        let row = sqlx::query_as::<_, SavedArticleRow>(
            r#"
            INSERT INTO saved_articles (id, user_id, kind, thread_id, username, result, url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, kind, thread_id, username, result, url, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(&input.kind)
        .bind(&input.thread_id)
        .bind(&input.username)
        .bind(&input.result)
        .bind(&input.url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_saved_articles(
        &self,
        user_id: Uuid,
        kind: Option<&str>,
    ) -> Result<Vec<SavedArticleRow>> {
        let rows = sqlx::query_as::<_, SavedArticleRow>(
            r#"
            SELECT id, user_id, kind, thread_id, username, result, url, created_at
            FROM saved_articles
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR kind = $2)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn delete_saved_article(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM saved_articles
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
