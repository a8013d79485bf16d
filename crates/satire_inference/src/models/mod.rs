use std::sync::Arc;
use satire_core::{ImageGenerator, Result, TextGenerator};
use tracing::info;
use crate::{Config, ModelKind};

pub mod offline;
pub mod openai;

pub use offline::OfflineModel;
pub use openai::OpenAiModel;

/// Text and image capabilities backed by the same upstream.
#[derive(Debug, Clone)]
pub struct Provider {
    pub text: Arc<dyn TextGenerator>,
    pub image: Arc<dyn ImageGenerator>,
}

impl Provider {
    pub fn from_model<M>(model: M) -> Self
    where
        M: TextGenerator + ImageGenerator + 'static,
    {
        let model = Arc::new(model);
        Self {
            text: model.clone(),
            image: model,
        }
    }

    pub fn name(&self) -> &str {
        self.text.name()
    }
}

/// Builds the configured provider. Credential problems surface here, at
/// startup, rather than on the first request.
pub fn create_model(config: &Config) -> Result<Provider> {
    let provider = match config.model {
        ModelKind::OpenAi => Provider::from_model(OpenAiModel::new(config)?),
        ModelKind::Offline => Provider::from_model(OfflineModel::default()),
    };
    info!("🧠 Generation provider ready (using {})", provider.name());
    Ok(provider)
}
