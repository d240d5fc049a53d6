//! Application error type mapping to HTTP status codes.
//!
//! Every error body has the shape `{"detail": "..."}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use mailrag_types::error::SummarizeError;

#[derive(Debug)]
pub enum AppError {
    /// Summarization failed in some stage.
    Summarize(SummarizeError),
    /// The request body could not be decoded.
    Validation(String),
    /// The request task itself failed.
    Internal(String),
}

impl From<SummarizeError> for AppError {
    fn from(e: SummarizeError) -> Self {
        AppError::Summarize(e)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Summarize(SummarizeError::InvalidRequest(_)) | AppError::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Summarize(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Summarize(e) => e.to_string(),
            AppError::Validation(msg) | AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.detail(), "request failed");
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
