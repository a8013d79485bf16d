use std::fmt;
use std::sync::Arc;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use satire_core::{
    ChatCompletionRequest, ChatCompletionResponse, Error, ImageGenerator, ImageRequest,
    ImageResponse, Result, TextGenerator,
};
use crate::{Config, API_KEY_ENV_VAR};

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// OpenAI-compatible HTTP provider for chat completions and image generation.
pub struct OpenAiModel {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Configuration(format!("{} environment variable is not set", API_KEY_ENV_VAR)))?
            .to_string();

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: serde::Serialize + Sync,
        R: serde::de::DeserializeOwned + Send,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Request to {} failed: {}", path, e)))?;

        let response = check_status(response).await?;
        response
            .json::<R>()
            .await
            .map_err(|e| Error::Provider(format!("Malformed response from {}: {}", path, e)))
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Provider(format!("{}: {}", status, error_message(&body))))
}

/// Pulls `error.message` out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl TextGenerator for OpenAiModel {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn create_chat_completion(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        tracing::debug!(model = %request.model, messages = request.messages.len(), "Requesting chat completion");
        self.post("/chat/completions", &request).await
    }
}

#[async_trait]
impl ImageGenerator for OpenAiModel {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn create_image(&self, request: ImageRequest) -> Result<ImageResponse> {
        tracing::debug!(n = request.n, "Requesting image generation");
        self.post("/images/generations", &request).await
    }
}
