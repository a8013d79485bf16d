use std::path::{Path, PathBuf};
use async_trait::async_trait;
use satire_core::{
    Article, ArticleStorage, Error, GenerationOutcome, GenerationStatus, NewArticle, Result,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        source TEXT,
        content TEXT NOT NULL,
        satirical_summary TEXT,
        satirical_image_url TEXT,
        status TEXT NOT NULL,
        generation_error TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl std::fmt::Debug for SQLiteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SQLiteStorage")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl SQLiteStorage {
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to run migration {}: {}", i, e)))?;
        }

        tracing::debug!("Opened SQLite database at {}", db_path.display());
        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// A single guarded UPDATE: concurrent readers see the old row or the new one,
    /// and only the first writer of a pending article wins.
    async fn write_back(&self, article: &Article) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET satirical_summary = ?, satirical_image_url = ?, status = ?, generation_error = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(article.satirical_summary.as_deref())
        .bind(article.satirical_image_url.as_deref())
        .bind(article.status.as_str())
        .bind(article.generation_error.as_deref())
        .bind(article.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to record generation: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(Error::Storage(format!("Article {} was generated concurrently", article.id)));
        }
        Ok(())
    }
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let id: String = row.get("id");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");

    Ok(Article {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::Storage(format!("Invalid article id {}: {}", id, e)))?,
        title: row.get("title"),
        source: row.get::<Option<String>, _>("source"),
        content: row.get("content"),
        satirical_summary: row.get::<Option<String>, _>("satirical_summary"),
        satirical_image_url: row.get::<Option<String>, _>("satirical_image_url"),
        status: status.parse::<GenerationStatus>()?,
        generation_error: row.get::<Option<String>, _>("generation_error"),
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| Error::Storage(format!("Failed to parse date: {}", e)))?
            .with_timezone(&chrono::Utc),
    })
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn create_article(&self, input: &NewArticle) -> Result<Article> {
        let article = Article::new(input);

        sqlx::query(
            r#"
            INSERT INTO articles
            (id, title, source, content, satirical_summary, satirical_image_url, status, generation_error, created_at)
            VALUES (?, ?, ?, ?, NULL, NULL, ?, NULL, ?)
            "#,
        )
        .bind(article.id.to_string())
        .bind(&article.title)
        .bind(article.source.as_deref())
        .bind(&article.content)
        .bind(article.status.as_str())
        .bind(article.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to store article: {}", e)))?;

        Ok(article)
    }

    async fn get_article(&self, id: Uuid) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to get article: {}", e)))?;

        row.as_ref().map(row_to_article).transpose()
    }

    async fn list_articles(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to list articles: {}", e)))?;

        rows.iter().map(row_to_article).collect()
    }

    async fn record_generation(&self, id: Uuid, outcome: &GenerationOutcome) -> Result<Article> {
        let mut article = self
            .get_article(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
        if article.status != GenerationStatus::Pending {
            return Err(Error::Storage(format!(
                "Article {} was already generated ({})",
                id,
                article.status.as_str()
            )));
        }
        article.apply(outcome);
        self.write_back(&article).await?;
        Ok(article)
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        tracing::debug!("Closed SQLite database at {}", self.db_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn submission(content: &str) -> NewArticle {
        NewArticle {
            content: content.to_string(),
            title: Some("Test Article".to_string()),
            source: None,
        }
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        // Create a temporary directory for the test database
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let storage = SQLiteStorage::open(&db_path).await.unwrap();
        assert_eq!(storage.get_db_path(), db_path.as_path());

        let article = storage
            .create_article(&submission("Local council approves new park."))
            .await
            .unwrap();
        let stored = storage.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(stored.id, article.id);
        assert_eq!(stored.content, "Local council approves new park.");
        assert_eq!(stored.status, GenerationStatus::Pending);
        assert!(stored.source.is_none());

        let outcome = GenerationOutcome {
            summary: Some("Grass exists.".to_string()),
            image_url: None,
            status: GenerationStatus::ImageFailed,
            error: Some("Error generating image: Provider error: 500".to_string()),
        };
        let updated = storage.record_generation(article.id, &outcome).await.unwrap();
        assert_eq!(updated.satirical_summary.as_deref(), Some("Grass exists."));
        assert!(updated.satirical_image_url.is_none());

        let reloaded = storage.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, GenerationStatus::ImageFailed);
        assert_eq!(reloaded.generation_error, outcome.error);

        let err = storage.record_generation(article.id, &outcome).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("articles.db");

        let storage = SQLiteStorage::open(&db_path).await.unwrap();
        let article = storage.create_article(&submission("Rain expected.")).await.unwrap();
        assert!(storage.get_article(Uuid::new_v4()).await.unwrap().is_none());
        storage.close().await.unwrap();

        let storage = SQLiteStorage::open(&db_path).await.unwrap();
        let articles = storage.list_articles().await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, article.id);
        storage.close().await.unwrap();
    }

    fn outcome(summary: &str) -> GenerationOutcome {
        GenerationOutcome {
            summary: Some(summary.to_string()),
            image_url: Some("https://img.example/abc123.png".to_string()),
            status: GenerationStatus::Complete,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_concurrent_record_generation_has_one_winner() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::open(&temp_dir.path().join("race.db")).await.unwrap();
        let article = storage.create_article(&submission("Rain expected.")).await.unwrap();

        let first = outcome("Sky leaks again.");
        let second = outcome("Clouds file for overtime.");
        let (a, b) = tokio::join!(
            storage.record_generation(article.id, &first),
            storage.record_generation(article.id, &second),
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(Error::Storage(_))));

        let stored = storage.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GenerationStatus::Complete);
        let summary = stored.satirical_summary.unwrap();
        assert!(summary == "Sky leaks again." || summary == "Clouds file for overtime.");
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_write_back_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::open(&temp_dir.path().join("stale.db")).await.unwrap();
        let created = storage.create_article(&submission("Rain expected.")).await.unwrap();

        // Both writers read the row while it was still pending.
        let mut first = storage.get_article(created.id).await.unwrap().unwrap();
        let mut second = first.clone();
        first.apply(&outcome("Sky leaks again."));
        second.apply(&outcome("Clouds file for overtime."));

        storage.write_back(&first).await.unwrap();
        let err = storage.write_back(&second).await.unwrap_err();
        assert!(err.to_string().contains("generated concurrently"));

        let stored = storage.get_article(created.id).await.unwrap().unwrap();
        assert_eq!(stored.satirical_summary.as_deref(), Some("Sky leaks again."));
        storage.close().await.unwrap();
    }
}
