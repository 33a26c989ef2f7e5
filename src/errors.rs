use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A rejection raised before the relay runs, rendered as `{error, message}`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status, title and message.
    pub fn new(status: StatusCode, error: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: msg.into(),
        }
    }

    /// Shortcut for a 400 Bad Request
    pub fn bad_request(error: &'static str, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, msg)
    }

    pub fn file_too_large(max_file_size: usize) -> Self {
        Self::bad_request(
            "File too large",
            format!(
                "File size must be less than {}MB",
                max_file_size.div_ceil(1024 * 1024)
            ),
        )
    }

    pub fn invalid_file_type() -> Self {
        Self::bad_request("Invalid file type", "Only image files are allowed")
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found", msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.error,
            "message": self.message,
        }));

        (self.status, body).into_response()
    }
}
