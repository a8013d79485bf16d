use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use satire_core::{Article, Error, GenerationOutcome, GenerationRequest, NewArticle};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;
use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct FieldValue {
    pub value: Option<String>,
}

type ApiResult<T> = std::result::Result<T, ApiError>;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_articles(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Article>>> {
    Ok(Json(state.storage.list_articles().await?))
}

async fn find_article(state: &AppState, id: Uuid) -> ApiResult<Article> {
    state
        .storage
        .get_article(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("article {}", id)).into())
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Article>> {
    Ok(Json(find_article(&state, id).await?))
}

pub async fn get_satirical_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FieldValue>> {
    let article = find_article(&state, id).await?;
    Ok(Json(FieldValue { value: article.satirical_summary }))
}

pub async fn get_satirical_image_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FieldValue>> {
    let article = find_article(&state, id).await?;
    Ok(Json(FieldValue { value: article.satirical_image_url }))
}

/// Stores the submitted text, runs the pipeline once and writes the outcome
/// back. If the client goes away mid-run the handler future is dropped, the
/// guard cancels the token and the article stays pending.
pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewArticle>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    let article = state.storage.create_article(&input).await?;
    info!(article_id = %article.id, "📰 Article submitted");

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let request = GenerationRequest::new(article.content.clone(), cancel);
    let result = state.pipeline.process_article(&request).await;

    let Some(outcome) = GenerationOutcome::from_result(&result) else {
        warn!(article_id = %article.id, "Generation cancelled, article left pending");
        return Err(Error::Cancelled.into());
    };
    let article = state.storage.record_generation(article.id, &outcome).await?;

    match result {
        Ok(_) => {
            info!(article_id = %article.id, "✨ Satirical summary and image generated");
            Ok((StatusCode::CREATED, Json(article)))
        }
        Err(e) if e.partial_summary().is_some() => {
            warn!(article_id = %article.id, error = %e.chain(), "Stored summary without image");
            Ok((StatusCode::CREATED, Json(article)))
        }
        Err(e) => {
            error!(article_id = %article.id, error = %e.chain(), "Satirical generation failed");
            Err(ApiError::generation(&e, article))
        }
    }
}
