// Generated image service: CRUD plus generation through the image endpoint

use anyhow::Result;
use contentdesk_upstream::{ImageRequest, UpstreamClient};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::generated_images::{GeneratedImage, GeneratedImagePreview};
use crate::error::ApiError;
use crate::storage::{CreateGeneratedImageRow, GeneratedImageRow, StorageBackend};

pub struct ImageService {
    db: Arc<StorageBackend>,
    upstream: UpstreamClient,
}

impl ImageService {
    pub fn new(db: Arc<StorageBackend>, upstream: UpstreamClient) -> Self {
        Self { db, upstream }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        prompt: &str,
        file_key: &str,
        image_url: &str,
    ) -> Result<GeneratedImage> {
        let row = self
            .db
            .create_generated_image(CreateGeneratedImageRow {
                user_id,
                prompt: prompt.to_string(),
                file_key: file_key.to_string(),
                image_url: image_url.to_string(),
            })
            .await?;
        Ok(Self::row_to_image(row))
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<GeneratedImage>> {
        let rows = self.db.list_generated_images(user_id).await?;
        Ok(rows.into_iter().map(Self::row_to_image).collect())
    }

    /// `false` when the image does not exist or belongs to someone else.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        self.db.delete_generated_image(id, user_id).await
    }

    /// Generate an image and record it in the background.
    pub async fn generate(
        &self,
        user_id: Uuid,
        prompt: &str,
    ) -> Result<GeneratedImagePreview, ApiError> {
        let generated = self
            .upstream
            .generate_image(&ImageRequest { prompt })
            .await?;

        let preview = GeneratedImagePreview {
            prompt: prompt.to_string(),
            file_key: generated.file_key,
            image_url: generated.image_url,
        };

        let db = self.db.clone();
        let row = CreateGeneratedImageRow {
            user_id,
            prompt: preview.prompt.clone(),
            file_key: preview.file_key.clone(),
            image_url: preview.image_url.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = db.create_generated_image(row).await {
                tracing::warn!(user_id = %user_id, "Failed to record generated image: {:#}", e);
            }
        });

        Ok(preview)
    }

    fn row_to_image(row: GeneratedImageRow) -> GeneratedImage {
        GeneratedImage {
            id: row.id,
            prompt: row.prompt,
            file_key: row.file_key,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}
