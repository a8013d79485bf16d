use std::fmt;
use sha2::{Digest, Sha256};
use satire_core::{
    ChatCompletionRequest, ChatCompletionResponse, ImageGenerator, ImageRequest, ImageResponse,
    Result, Role, TextGenerator,
};

const SUMMARY_WORDS: usize = 20;
const ARTICLE_MARKER: &str = "Article content:";
const SUMMARY_MARKER: &str = "Summary:";

/// Deterministic provider that never touches the network. Handy for local
/// runs of the API and for tests.
pub struct OfflineModel {
    image_base_url: String,
}

impl fmt::Debug for OfflineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfflineModel")
            .field("image_base_url", &self.image_base_url)
            .finish()
    }
}

impl Default for OfflineModel {
    fn default() -> Self {
        Self::new("https://offline.invalid/images")
    }
}

impl OfflineModel {
    pub fn new(image_base_url: impl Into<String>) -> Self {
        Self {
            image_base_url: image_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Text following `marker` in the prompt, or the whole prompt.
fn payload<'a>(prompt: &'a str, marker: &str) -> &'a str {
    prompt
        .rsplit_once(marker)
        .map(|(_, rest)| rest)
        .unwrap_or(prompt)
        .trim()
}

#[async_trait::async_trait]
impl TextGenerator for OfflineModel {
    fn name(&self) -> &str {
        "Offline"
    }

    async fn create_chat_completion(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        // Take first 20 words and dress them up
        let words: Vec<&str> = payload(prompt, ARTICLE_MARKER)
            .split_whitespace()
            .take(SUMMARY_WORDS)
            .collect();
        if words.is_empty() {
            return Ok(ChatCompletionResponse::default());
        }
        let summary = format!("In a stunning development nobody asked for: {}", words.join(" "));
        tracing::debug!("Generated offline summary: {}", summary);
        Ok(ChatCompletionResponse::with_texts([summary]))
    }
}

#[async_trait::async_trait]
impl ImageGenerator for OfflineModel {
    fn name(&self) -> &str {
        "Offline"
    }

    async fn create_image(&self, request: ImageRequest) -> Result<ImageResponse> {
        let digest = Sha256::digest(payload(&request.prompt, SUMMARY_MARKER).as_bytes());
        let stem: String = digest.iter().take(8).map(|b| format!("{:02x}", b)).collect();
        let urls = (0..request.n).map(|i| format!("{}/{}-{}.png", self.image_base_url, stem, i));
        Ok(ImageResponse::with_urls(urls))
    }
}
