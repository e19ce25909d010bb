// Generated audio service
// Decision: The record is written inline, but a failed write still returns the generated audio

use anyhow::Result;
use contentdesk_upstream::{SpeechRequest, UpstreamClient};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::generated_audio::GeneratedAudio;
use crate::error::ApiError;
use crate::storage::{CreateGeneratedAudioRow, GeneratedAudioRow, StorageBackend};

pub struct AudioService {
    db: Arc<StorageBackend>,
    upstream: UpstreamClient,
}

impl AudioService {
    pub fn new(db: Arc<StorageBackend>, upstream: UpstreamClient) -> Self {
        Self { db, upstream }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<GeneratedAudio>> {
        let rows = self.db.list_generated_audio(user_id).await?;
        Ok(rows.into_iter().map(Self::row_to_audio).collect())
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        self.db.delete_generated_audio(id, user_id).await
    }

    /// Synthesize `text` with the TTS service and record the result.
    ///
    /// Inputs are expected to be validated already.
    pub async fn synthesize(
        &self,
        user_id: Uuid,
        text: &str,
        description: &str,
        voice_label: Option<&str>,
    ) -> Result<GeneratedAudio, ApiError> {
        let speech = self
            .upstream
            .synthesize_speech(&SpeechRequest { text, description })
            .await?;

        let input = CreateGeneratedAudioRow {
            user_id,
            text: text.to_string(),
            description: description.to_string(),
            voice_label: voice_label.map(str::to_string),
            audio_url: speech.audio_url,
        };

        match self.db.create_generated_audio(input.clone()).await {
            Ok(row) => Ok(Self::row_to_audio(row)),
            Err(e) => {
                tracing::warn!(user_id = %user_id, "Failed to record generated audio: {:#}", e);
                Ok(GeneratedAudio {
                    id: None,
                    text: input.text,
                    description: input.description,
                    voice_label: input.voice_label,
                    audio_url: input.audio_url,
                    created_at: None,
                })
            }
        }
    }

    fn row_to_audio(row: GeneratedAudioRow) -> GeneratedAudio {
        GeneratedAudio {
            id: Some(row.id),
            text: row.text,
            description: row.description,
            voice_label: row.voice_label,
            audio_url: row.audio_url,
            created_at: Some(row.created_at),
        }
    }
}
