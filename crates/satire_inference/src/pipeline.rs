//! Two-stage generation: satirical summary first, then an illustration
//! prompted by that summary.
//!
//! Error composition:
//! - a failed summary stage yields [`Error::SummaryGeneration`] and nothing else;
//! - a failed image stage yields [`Error::ImageGeneration`], which still carries
//!   the summary so the caller can keep it (partial success);
//! - cancellation is reported as a bare [`Error::Cancelled`] from either stage.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use satire_core::{
    ChatCompletionRequest, ChatMessage, Error, GenerationRequest, GenerationResult,
    ImageGenerator, ImageRequest, ImageResponseFormat, ImageSize, Result, TextGenerator,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::models::Provider;
use crate::prompts;

/// Per-request progress, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Pending,
    SummaryInFlight,
    SummaryFailed,
    SummaryReady,
    ImageInFlight,
    ImageFailed,
    Complete,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::SummaryInFlight => "summary_in_flight",
            Self::SummaryFailed => "summary_failed",
            Self::SummaryReady => "summary_ready",
            Self::ImageInFlight => "image_in_flight",
            Self::ImageFailed => "image_failed",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub struct ContentGenerationPipeline {
    text: Arc<dyn TextGenerator>,
    image: Arc<dyn ImageGenerator>,
    chat_model: String,
}

impl fmt::Debug for ContentGenerationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentGenerationPipeline")
            .field("text", &self.text.name())
            .field("image", &self.image.name())
            .field("chat_model", &self.chat_model)
            .finish()
    }
}

impl ContentGenerationPipeline {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
        chat_model: impl Into<String>,
    ) -> Self {
        Self {
            text,
            image,
            chat_model: chat_model.into(),
        }
    }

    pub fn from_provider(provider: &Provider, chat_model: impl Into<String>) -> Self {
        Self::new(provider.text.clone(), provider.image.clone(), chat_model)
    }

    pub async fn generate_summary(&self, cancel: &CancellationToken, content: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.chat_model.clone(),
            messages: vec![
                ChatMessage::system(prompts::SUMMARY_SYSTEM_PROMPT),
                ChatMessage::user(prompts::summary_prompt(content)),
            ],
        };

        let response = run_cancellable(cancel, self.text.create_chat_completion(request)).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyResponse("no completion choices returned".to_string()))?;

        let summary = choice.message.content.trim();
        if summary.is_empty() {
            return Err(Error::EmptyResponse("completion choice has no content".to_string()));
        }
        Ok(summary.to_string())
    }

    pub async fn generate_image(&self, cancel: &CancellationToken, summary: &str) -> Result<String> {
        let request = ImageRequest {
            prompt: prompts::image_prompt(summary),
            n: 1,
            size: ImageSize::Square1024,
            response_format: ImageResponseFormat::Url,
        };

        let response = run_cancellable(cancel, self.image.create_image(request)).await?;

        let image_url = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyResponse("no images returned".to_string()))?
            .url
            .ok_or_else(|| Error::EmptyResponse("image descriptor has no URL".to_string()))?;

        Url::parse(&image_url).map_err(|e| Error::InvalidUrl(format!("{}: {}", image_url, e)))?;
        Ok(image_url)
    }

    pub async fn process_article(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let cancel = &request.cancel;
        debug!(stage = %PipelineStage::SummaryInFlight, "📝 Generating satirical summary");

        let summary = match self.generate_summary(cancel, &request.content).await {
            Ok(summary) => summary,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                warn!(stage = %PipelineStage::SummaryFailed, error = %e, "Summary generation failed");
                return Err(Error::summary_generation(e));
            }
        };
        debug!(stage = %PipelineStage::SummaryReady, chars = summary.len(), "Summary ready");

        // Nothing is issued upstream once the caller has given up.
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        debug!(stage = %PipelineStage::ImageInFlight, "🎨 Generating satirical image");
        let image_url = match self.generate_image(cancel, &summary).await {
            Ok(url) => url,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                warn!(stage = %PipelineStage::ImageFailed, error = %e, "Image generation failed");
                return Err(Error::image_generation(summary, e));
            }
        };
        debug!(stage = %PipelineStage::Complete, %image_url, "Article processed");

        Ok(GenerationResult { summary, image_url })
    }
}

/// Races an outbound call against the token. The call future is dropped, and
/// with it the underlying request, as soon as the token fires.
async fn run_cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = call => result,
    }
}
