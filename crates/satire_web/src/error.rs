use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use satire_core::{Article, Error};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    article: Option<Article>,
}

/// JSON error returned by the handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    article: Option<Article>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// A failed pipeline run, reported together with the persisted article so
    /// the caller can tell "generation failed" apart from "never generated".
    pub fn generation(err: &Error, article: Article) -> Self {
        Self {
            status: status_for(err),
            message: err.chain(),
            article: Some(article),
        }
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Provider(_)
        | Error::EmptyResponse(_)
        | Error::InvalidUrl(_)
        | Error::SummaryGeneration(_)
        | Error::ImageGeneration { .. } => StatusCode::BAD_GATEWAY,
        Error::Cancelled => StatusCode::REQUEST_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self {
            status: status_for(&err),
            message: err.chain(),
            article: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            article: self.article,
        };
        (self.status, Json(body)).into_response()
    }
}
