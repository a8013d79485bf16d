use async_trait::async_trait;
use satire_core::{
    Article, ArticleStorage, Error, GenerationOutcome, GenerationStatus, NewArticle, Result,
};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    articles: RwLock<Vec<Article>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn create_article(&self, input: &NewArticle) -> Result<Article> {
        let article = Article::new(input);
        self.articles.write().await.push(article.clone());
        Ok(article)
    }

    async fn get_article(&self, id: Uuid) -> Result<Option<Article>> {
        let articles = self.articles.read().await;
        Ok(articles.iter().find(|a| a.id == id).cloned())
    }

    async fn list_articles(&self) -> Result<Vec<Article>> {
        let mut articles = self.articles.read().await.clone();
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(articles)
    }

    async fn record_generation(&self, id: Uuid, outcome: &GenerationOutcome) -> Result<Article> {
        // The write lock is held for the whole update so readers see either the
        // pending article or the finished one.
        let mut articles = self.articles.write().await;
        let article = articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
        if article.status != GenerationStatus::Pending {
            return Err(Error::Storage(format!(
                "Article {} was already generated ({})",
                id,
                article.status.as_str()
            )));
        }
        article.apply(outcome);
        Ok(article.clone())
    }
}
