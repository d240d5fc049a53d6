//! Summarization endpoint.
//!
//! POST /summarize (and /api/summarize) - Summarize one email and extract
//! its action items, using similar stored emails as worked examples.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use mailrag_types::email::{SummarizationRequest, SummarizationResult};

use crate::http::error::AppError;
use crate::state::AppState;

/// POST /summarize
///
/// The pipeline runs in its own task: if the client disconnects, in-flight
/// embedding and completion calls still finish within their timeouts.
pub async fn summarize(
    State(state): State<AppState>,
    payload: Result<Json<SummarizationRequest>, JsonRejection>,
) -> Result<Json<SummarizationResult>, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    let summarizer = Arc::clone(&state.summarizer);
    let result = tokio::spawn(async move { summarizer.summarize(&request).await })
        .await
        .map_err(|e| AppError::Internal(format!("summarization task failed: {e}")))??;

    Ok(Json(result))
}
