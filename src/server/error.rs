//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`StreamError`] so that route handlers can
//! return `Result<Response, AppError>` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::streaming::StreamError;

/// Wrapper so route handlers get a uniform error response shape.
pub struct AppError(StreamError);

impl From<StreamError> for AppError {
    fn from(e: StreamError) -> Self {
        Self(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self(StreamError::Io(e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            StreamError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            StreamError::TranscodeUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "transcode_unavailable")
            }
            StreamError::Tool(_) => (StatusCode::INTERNAL_SERVER_ERROR, "tool_error"),
            StreamError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "server error in stream handler");
        }

        let body = json!({
            "error": self.0.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
