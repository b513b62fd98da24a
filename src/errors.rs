use axum::{Json, http::StatusCode};
use serde_json::json;

/// Request-level failure. The journal itself never errors; this only covers
/// malformed input and the blocking-pool plumbing around it.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{}", self.message);
        }
        let body = json!({ "error": { "message": self.message, "code": self.status.as_u16() } });
        (self.status, Json(body)).into_response()
    }
}
