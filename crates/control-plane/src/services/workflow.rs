// AI backend workflow pass-through
// Decision: Bodies are forwarded and relayed unchanged; only the fields a workflow cannot
// run without are checked here
// Decision: Finished blog and news generations are saved in the background

use contentdesk_upstream::{ArticleKind, GeneratedArticle, UpstreamClient};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::ArticleService;
use crate::api::validation::non_blank;
use crate::auth::AuthUser;
use crate::error::ApiError;

/// AI backend workflows exposed under `/api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    GenerateBlog,
    GenerateNews,
    RepurposeArticle,
    YoutubeBlog,
    XPostGenerate,
    XPostIdeas,
    VisualPost,
    ImagePrompt,
}

impl Workflow {
    /// Path relative to the AI backend base URL.
    pub fn upstream_path(&self) -> &'static str {
        match self {
            Workflow::GenerateBlog => "/generate-blog",
            Workflow::GenerateNews => "/generate-news",
            Workflow::RepurposeArticle => "/repurpose-article",
            Workflow::YoutubeBlog => "/youtube-blog",
            Workflow::XPostGenerate => "/x-post/generate",
            Workflow::XPostIdeas => "/x-post/ideas",
            Workflow::VisualPost => "/generate-visual-post",
            Workflow::ImagePrompt => "/image-prompt",
        }
    }

    /// Workflows whose finished output is kept as a saved article.
    pub fn article_kind(&self) -> Option<ArticleKind> {
        match self {
            Workflow::GenerateBlog => Some(ArticleKind::Blog),
            Workflow::GenerateNews => Some(ArticleKind::News),
            _ => None,
        }
    }

    pub fn validate(&self, body: &Map<String, Value>) -> Result<(), ApiError> {
        match self {
            Workflow::XPostGenerate => {
                if text_field(body, "topic").is_none() || text_field(body, "objective").is_none() {
                    return Err(ApiError::validation("Topic and objective are required."));
                }
            }
            Workflow::XPostIdeas => validate_ideas(body)?,
            Workflow::RepurposeArticle => {
                if text_field(body, "article_text").is_none() {
                    return Err(ApiError::validation("Article text is required."));
                }
            }
            Workflow::YoutubeBlog => {
                if text_field(body, "youtube_url").is_none() {
                    return Err(ApiError::validation("YouTube URL is required."));
                }
            }
            Workflow::GenerateBlog
            | Workflow::GenerateNews
            | Workflow::VisualPost
            | Workflow::ImagePrompt => {}
        }
        Ok(())
    }
}

fn text_field<'a>(body: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    non_blank(body.get(field).and_then(Value::as_str))
}

/// `keywords`: array of strings (empty asks for trending ideas). `count`: positive integer.
fn validate_ideas(body: &Map<String, Value>) -> Result<(), ApiError> {
    let keywords_ok = match body.get("keywords") {
        Some(Value::Array(items)) => items.iter().all(Value::is_string),
        _ => false,
    };
    if !keywords_ok {
        return Err(ApiError::validation("Keywords must be an array of strings."));
    }

    match body.get("count") {
        None | Some(Value::Null) => Ok(()),
        Some(count) if count.as_u64().is_some_and(|n| n > 0) => Ok(()),
        Some(_) => Err(ApiError::validation("Count must be a positive integer.")),
    }
}

pub struct WorkflowService {
    upstream: UpstreamClient,
    articles: Arc<ArticleService>,
}

impl WorkflowService {
    pub fn new(upstream: UpstreamClient, articles: Arc<ArticleService>) -> Self {
        Self { upstream, articles }
    }

    /// Validate, forward, and relay the AI backend reply.
    pub async fn run(
        &self,
        workflow: Workflow,
        user: &AuthUser,
        body: Value,
    ) -> Result<Value, ApiError> {
        let Value::Object(fields) = &body else {
            return Err(ApiError::validation("Request body must be a JSON object"));
        };
        workflow.validate(fields)?;

        tracing::debug!(
            user_id = %user.id,
            workflow = workflow.upstream_path(),
            "Forwarding workflow request"
        );
        let reply = self
            .upstream
            .run_workflow(workflow.upstream_path(), &body)
            .await?;

        if let Some(kind) = workflow.article_kind() {
            if let Some(article) = GeneratedArticle::from_value(kind, &reply) {
                self.articles
                    .record_generated(user.id, &user.username, kind, article);
            }
        }

        Ok(reply)
    }
}
