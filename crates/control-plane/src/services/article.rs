// Saved article service (newsroom articles and blogs)

use anyhow::Result;
use contentdesk_upstream::{ArticleKind, GeneratedArticle};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::articles::SavedArticle;
use crate::storage::{CreateSavedArticleRow, SavedArticleRow, StorageBackend};

pub struct ArticleService {
    db: Arc<StorageBackend>,
}

impl ArticleService {
    pub fn new(db: Arc<StorageBackend>) -> Self {
        Self { db }
    }

    pub async fn save(
        &self,
        user_id: Uuid,
        username: &str,
        kind: ArticleKind,
        thread_id: &str,
        result: &str,
        url: &str,
    ) -> Result<SavedArticle> {
        let row = self
            .db
            .create_saved_article(CreateSavedArticleRow {
                user_id,
                kind: kind.as_str().to_string(),
                thread_id: thread_id.to_string(),
                username: username.to_string(),
                result: result.to_string(),
                url: url.to_string(),
            })
            .await?;
        Ok(Self::row_to_article(row))
    }

    pub async fn list(&self, user_id: Uuid, kind: Option<ArticleKind>) -> Result<Vec<SavedArticle>> {
        let rows = self
            .db
            .list_saved_articles(user_id, kind.map(|k| k.as_str()))
            .await?;
        Ok(rows.into_iter().map(Self::row_to_article).collect())
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        self.db.delete_saved_article(id, user_id).await
    }

    /// Record a finished generation workflow in the background.
    pub fn record_generated(
        self: &Arc<Self>,
        user_id: Uuid,
        username: &str,
        kind: ArticleKind,
        article: GeneratedArticle,
    ) {
        let service = Arc::clone(self);
        let username = username.to_string();
        tokio::spawn(async move {
            let saved = service
                .save(user_id, &username, kind, &article.thread_id, &article.text, "")
                .await;
            if let Err(e) = saved {
                tracing::warn!(
                    user_id = %user_id,
                    kind = %kind,
                    thread_id = %article.thread_id,
                    "Failed to record generated article: {:#}",
                    e
                );
            }
        });
    }

    fn row_to_article(row: SavedArticleRow) -> SavedArticle {
        SavedArticle {
            id: row.id,
            kind: row.kind,
            thread_id: row.thread_id,
            username: row.username,
            result: row.result,
            url: row.url,
            created_at: row.created_at,
        }
    }
}
