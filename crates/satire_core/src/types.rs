use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub source: Option<String>,
    pub content: String,
    pub satirical_summary: Option<String>,
    pub satirical_image_url: Option<String>,
    pub status: GenerationStatus,
    pub generation_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Article {
    pub fn new(input: &NewArticle) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title.clone().unwrap_or_default(),
            source: input.source.clone(),
            content: input.content.clone(),
            satirical_summary: None,
            satirical_image_url: None,
            status: GenerationStatus::Pending,
            generation_error: None,
            created_at: Utc::now(),
        }
    }

    /// Applies the one-time write-back of a pipeline run.
    pub fn apply(&mut self, outcome: &GenerationOutcome) {
        self.satirical_summary = outcome.summary.clone();
        // An image without a summary is never stored.
        self.satirical_image_url = outcome
            .summary
            .as_ref()
            .and(outcome.image_url.clone());
        self.status = outcome.status;
        self.generation_error = outcome.error.clone();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewArticle {
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Where an article stands with respect to its single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Pending,
    Complete,
    SummaryFailed,
    ImageFailed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::SummaryFailed => "summary_failed",
            Self::ImageFailed => "image_failed",
        }
    }
}

impl std::str::FromStr for GenerationStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "complete" => Ok(Self::Complete),
            "summary_failed" => Ok(Self::SummaryFailed),
            "image_failed" => Ok(Self::ImageFailed),
            other => Err(crate::Error::Storage(format!("Unknown generation status: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub content: String,
    pub cancel: CancellationToken,
}

impl GenerationRequest {
    pub fn new(content: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            content: content.into(),
            cancel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub summary: String,
    pub image_url: String,
}

/// What gets written back onto an [`Article`] after a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub status: GenerationStatus,
    pub error: Option<String>,
}

impl GenerationOutcome {
    /// Folds a pipeline result into the fields to persist. Cancellation has no
    /// outcome: the article is left pending.
    pub fn from_result(result: &crate::Result<GenerationResult>) -> Option<Self> {
        match result {
            Ok(generated) => Some(Self {
                summary: Some(generated.summary.clone()),
                image_url: Some(generated.image_url.clone()),
                status: GenerationStatus::Complete,
                error: None,
            }),
            Err(err) if err.is_cancelled() => None,
            Err(err) => match err.partial_summary() {
                Some(summary) => Some(Self {
                    summary: Some(summary.to_string()),
                    image_url: None,
                    status: GenerationStatus::ImageFailed,
                    error: Some(err.chain()),
                }),
                None => Some(Self {
                    summary: None,
                    image_url: None,
                    status: GenerationStatus::SummaryFailed,
                    error: Some(err.chain()),
                }),
            },
        }
    }
}
