use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Error generating summary")]
    SummaryGeneration(#[source] Box<Error>),

    /// The summary was produced but the illustration was not. The summary is
    /// kept so the caller can persist a partial result.
    #[error("Error generating image")]
    ImageGeneration {
        summary: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Generation cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn summary_generation(cause: Error) -> Self {
        Self::SummaryGeneration(Box::new(cause))
    }

    pub fn image_generation(summary: impl Into<String>, cause: Error) -> Self {
        Self::ImageGeneration {
            summary: summary.into(),
            source: Box::new(cause),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Summary text that survived a failed image stage, if any.
    pub fn partial_summary(&self) -> Option<&str> {
        match self {
            Self::ImageGeneration { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// Innermost error of a stage wrap.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::SummaryGeneration(cause) => cause.root_cause(),
            Self::ImageGeneration { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Renders the error and every `source()` below it as one line.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            current = cause.source();
        }
        rendered
    }
}

pub type Result<T> = std::result::Result<T, Error>;
