use async_trait::async_trait;
use uuid::Uuid;
use crate::types::{Article, GenerationOutcome, NewArticle};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Persist freshly submitted article text. The article starts out pending.
    async fn create_article(&self, input: &NewArticle) -> Result<Article>;

    async fn get_article(&self, id: Uuid) -> Result<Option<Article>>;

    /// All articles, newest first.
    async fn list_articles(&self) -> Result<Vec<Article>>;

    /// Write back the outcome of the pipeline run. Only a pending article can be
    /// updated, and the update becomes visible to readers all at once.
    async fn record_generation(&self, id: Uuid, outcome: &GenerationOutcome) -> Result<Article>;

    /// Release the backend's resources. Called once by the owner on shutdown.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
