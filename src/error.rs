use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Bad request", "message": msg }),
            ),
            AppError::InvalidAction(_) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Invalid action",
                    "message": "Use action: \"track\" or \"review\""
                }),
            ),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed" }),
            ),
            AppError::Upstream(msg) | AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Server error", "message": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
