use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub mod models;
pub mod pipeline;
pub mod prompts;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelKind {
    #[default]
    OpenAi,
    Offline,
}

impl FromStr for ModelKind {
    type Err = satire_core::Error;

    fn from_str(s: &str) -> satire_core::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "offline" => Ok(Self::Offline),
            other => Err(satire_core::Error::Configuration(format!(
                "Unknown model '{}'. Available models: openai, offline",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => f.write_str("openai"),
            Self::Offline => f.write_str("offline"),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub model: ModelKind,
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub request_timeout: Option<Duration>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            request_timeout: None,
        }
    }
}

pub mod prelude {
    pub use super::{Config, ModelKind};
    pub use super::models::{create_model, Provider};
    pub use super::pipeline::ContentGenerationPipeline;
    pub use satire_core::{Error, GenerationRequest, GenerationResult, Result};
}

pub use models::{create_model, Provider};
pub use pipeline::ContentGenerationPipeline;
