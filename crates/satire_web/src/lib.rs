use axum::{
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/articles", get(handlers::list_articles).post(handlers::create_article))
        .route("/api/articles/:id", get(handlers::get_article))
        .route("/api/articles/:id/satirical-summary", get(handlers::get_satirical_summary))
        .route("/api/articles/:id/satirical-image-url", get(handlers::get_satirical_image_url))
        // A panicking handler or provider becomes a 500 instead of a dropped connection.
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Serves the API until `shutdown` resolves.
pub async fn serve<F>(state: AppState, addr: SocketAddr, shutdown: F) -> satire_core::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌐 Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

pub mod prelude {
    pub use satire_core::{Article, Error, Result};
    pub use crate::{create_app, serve, AppState};
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use satire_core::{
        Article, ArticleStorage, ChatCompletionRequest, ChatCompletionResponse, Error,
        GenerationStatus, ImageGenerator, ImageRequest, ImageResponse, Result, TextGenerator,
    };
    use satire_inference::models::OfflineModel;
    use satire_inference::ContentGenerationPipeline;
    use satire_storage::MemoryStorage;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Debug)]
    struct Failing(&'static str);

    #[async_trait]
    impl TextGenerator for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn create_chat_completion(&self, _request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
            Err(Error::Provider(self.0.to_string()))
        }
    }

    #[async_trait]
    impl ImageGenerator for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn create_image(&self, _request: ImageRequest) -> Result<ImageResponse> {
            Err(Error::Provider(self.0.to_string()))
        }
    }

    /// Never answers. Sets `dropped` once the in-flight call is torn down.
    #[derive(Debug, Default)]
    struct Hanging {
        dropped: Arc<AtomicBool>,
    }

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl TextGenerator for Hanging {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn create_chat_completion(&self, _request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
            let _flag = SetOnDrop(self.dropped.clone());
            std::future::pending::<()>().await;
            unreachable!("pending never resolves")
        }
    }

    #[derive(Debug)]
    struct Panicking;

    #[async_trait]
    impl TextGenerator for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn create_chat_completion(&self, _request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
            panic!("provider blew up")
        }
    }

    fn app_with(
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
    ) -> (Router, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let pipeline = ContentGenerationPipeline::new(text, image, "gpt-4");
        (create_app(AppState::new(storage.clone(), pipeline)), storage)
    }

    fn offline_app() -> (Router, Arc<MemoryStorage>) {
        let model = Arc::new(OfflineModel::new("https://img.example"));
        app_with(model.clone(), model)
    }

    fn post_article(content: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/articles")
            .header("content-type", "application/json")
            .body(Body::from(json!({"content": content, "title": "Park"}).to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_article_runs_pipeline() {
        let (app, storage) = offline_app();

        let response = app
            .clone()
            .oneshot(post_article("Local council approves new park."))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let article: Article = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(article.status, GenerationStatus::Complete);
        assert!(article.satirical_summary.unwrap().contains("Local council approves new park."));
        assert!(article.satirical_image_url.unwrap().starts_with("https://img.example/"));

        let stored = storage.get_article(article.id).await.unwrap().unwrap();
        let response = app
            .clone()
            .oneshot(get(&format!("/api/articles/{}/satirical-image-url", article.id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["value"], json!(stored.satirical_image_url));

        let response = app.oneshot(get("/api/articles")).await.unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_failure_is_reported_and_recorded() {
        let (app, storage) = app_with(Arc::new(Failing("insufficient_quota")), Arc::new(OfflineModel::default()));

        let response = app.oneshot(post_article("Local council approves new park.")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("insufficient_quota"));
        assert_eq!(body["article"]["status"], "summary_failed");
        assert!(body["article"]["satirical_summary"].is_null());

        let articles = storage.list_articles().await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].status, GenerationStatus::SummaryFailed);
        assert!(articles[0].satirical_image_url.is_none());
    }

    #[tokio::test]
    async fn test_image_failure_keeps_summary() {
        let (app, _storage) = app_with(Arc::new(OfflineModel::default()), Arc::new(Failing("server_error")));

        let response = app.oneshot(post_article("Local council approves new park.")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let article: Article = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(article.status, GenerationStatus::ImageFailed);
        assert!(article.satirical_summary.is_some());
        assert!(article.satirical_image_url.is_none());
        assert!(article.generation_error.unwrap().contains("server_error"));
    }

    #[tokio::test]
    async fn test_unknown_article_is_404() {
        let (app, _storage) = offline_app();
        let response = app
            .clone()
            .oneshot(get(&format!("/api/articles/{}", uuid::Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_client_disconnect_cancels_generation() {
        let text = Arc::new(Hanging::default());
        let dropped = text.dropped.clone();
        let (app, storage) = app_with(text, Arc::new(OfflineModel::default()));

        // Giving up on the response drops the handler future, as a disconnect does.
        let result = tokio::time::timeout(
            Duration::from_millis(100),
            app.oneshot(post_article("Local council approves new park.")),
        )
        .await;
        assert!(result.is_err());
        assert!(dropped.load(Ordering::SeqCst));

        let articles = storage.list_articles().await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].status, GenerationStatus::Pending);
        assert!(articles[0].satirical_summary.is_none());
        assert!(articles[0].generation_error.is_none());
    }

    #[tokio::test]
    async fn test_provider_panic_is_500() {
        let (app, storage) = app_with(Arc::new(Panicking), Arc::new(OfflineModel::default()));

        let response = app
            .clone()
            .oneshot(post_article("Local council approves new park."))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // The server keeps answering after the panic.
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(storage.list_articles().await.unwrap()[0].status, GenerationStatus::Pending);
    }
}
