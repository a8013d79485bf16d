use std::sync::Arc;
use satire_core::ArticleStorage;
use satire_inference::ContentGenerationPipeline;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
    pub pipeline: ContentGenerationPipeline,
}

impl AppState {
    pub fn new(storage: Arc<dyn ArticleStorage>, pipeline: ContentGenerationPipeline) -> Self {
        Self { storage, pipeline }
    }
}
