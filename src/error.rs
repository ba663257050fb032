// src/error.rs
// HTTP boundary errors. Provider plumbing uses anyhow internally; handlers
// convert into AppError so the router can answer with a JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The primary content fetch failed; the route cannot answer.
    #[error("upstream fetch failed: {0}")]
    Upstream(#[source] anyhow::Error),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn upstream(e: anyhow::Error) -> Self {
        AppError::Upstream(e)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Upstream(e) => {
                tracing::warn!(error = ?e, "upstream fetch failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "Upstream provider error",
                    Some(format!("{e:#}")),
                )
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });
        (status, body).into_response()
    }
}
