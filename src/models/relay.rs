//! Relay request and outcome types, plus the JSON shapes returned to callers.

use crate::models::upload::UploadedFile;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// One outbound call: the upload plus where and how long to wait.
#[derive(Clone, Debug)]
pub struct RelayRequest {
    pub file: UploadedFile,
    pub url: String,
    pub timeout: Duration,
}

/// Terminal outcome of a relay. Exactly one is produced per request.
#[derive(Clone, Debug, PartialEq)]
pub enum RelayResult {
    /// Upstream answered 2xx; the payload is its body.
    Success(Value),
    /// Upstream answered with a non-success status.
    UpstreamError { status: StatusCode, details: Value },
    /// Upstream could not be reached.
    NetworkError(String),
    /// No response arrived within the configured timeout.
    Timeout(String),
    /// The caller's input was unusable; nothing was sent.
    LocalValidationError(String),
    /// Any other local failure.
    Internal(String),
}

#[derive(Serialize)]
struct SuccessBody<'a> {
    success: bool,
    data: &'a Value,
    message: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

impl RelayResult {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayResult::Success(_) => StatusCode::OK,
            RelayResult::UpstreamError { status, .. } => *status,
            RelayResult::NetworkError(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayResult::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            RelayResult::LocalValidationError(_) => StatusCode::BAD_REQUEST,
            RelayResult::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayResult::Success(_) => "success",
            RelayResult::UpstreamError { .. } => "upstream_error",
            RelayResult::NetworkError(_) => "network_error",
            RelayResult::Timeout(_) => "timeout",
            RelayResult::LocalValidationError(_) => "validation_error",
            RelayResult::Internal(_) => "internal_error",
        }
    }

    /// Render the JSON body. Only the success body carries `timestamp`.
    pub fn to_body(&self, timestamp: DateTime<Utc>) -> Value {
        let rendered = match self {
            RelayResult::Success(data) => serde_json::to_value(SuccessBody {
                success: true,
                data,
                message: "OCR processing completed successfully",
                timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
            RelayResult::UpstreamError { status, details } => serde_json::to_value(ErrorBody {
                error: "OCR API Error",
                message: "The OCR service returned an error",
                details: Some(details),
                status: Some(status.as_u16()),
            }),
            RelayResult::NetworkError(details) => {
                let details = Value::String(details.clone());
                serde_json::to_value(ErrorBody {
                    error: "Network Error",
                    message: "Unable to connect to the OCR service",
                    details: Some(&details),
                    status: None,
                })
            }
            RelayResult::Timeout(details) => {
                let details = Value::String(details.clone());
                serde_json::to_value(ErrorBody {
                    error: "Request timeout",
                    message: "The OCR service took too long to respond",
                    details: Some(&details),
                    status: None,
                })
            }
            RelayResult::LocalValidationError(reason) => Ok(serde_json::json!({
                "error": reason,
                "message": "Please upload an image file",
            })),
            RelayResult::Internal(details) => {
                let details = Value::String(details.clone());
                serde_json::to_value(ErrorBody {
                    error: "Internal Server Error",
                    message: "An unexpected error occurred",
                    details: Some(&details),
                    status: None,
                })
            }
        };

        // Every field is plain data; serialization cannot fail.
        rendered.unwrap_or(Value::Null)
    }
}

impl IntoResponse for RelayResult {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_body(Utc::now()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-02T03:04:05.678Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_success_body() {
        let result = RelayResult::Success(json!({"amount": 100}));
        assert_eq!(result.status(), StatusCode::OK);
        assert_eq!(
            result.to_body(fixed_time()),
            json!({
                "success": true,
                "data": {"amount": 100},
                "message": "OCR processing completed successfully",
                "timestamp": "2025-01-02T03:04:05.678Z"
            })
        );
    }

    #[test]
    fn test_upstream_error_keeps_status() {
        let result = RelayResult::UpstreamError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            details: json!({"detail": "bad image"}),
        };
        assert_eq!(result.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            result.to_body(fixed_time()),
            json!({
                "error": "OCR API Error",
                "message": "The OCR service returned an error",
                "details": {"detail": "bad image"},
                "status": 422
            })
        );
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            RelayResult::NetworkError("refused".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            RelayResult::Timeout("slow".into()).status(),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            RelayResult::LocalValidationError("no file uploaded".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayResult::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_body_has_no_details() {
        let body = RelayResult::LocalValidationError("No file uploaded".into()).to_body(fixed_time());
        assert_eq!(
            body,
            json!({"error": "No file uploaded", "message": "Please upload an image file"})
        );
    }

    #[test]
    fn test_timeout_body() {
        let body = RelayResult::Timeout("timeout of 30ms exceeded".into()).to_body(fixed_time());
        assert_eq!(body["error"], "Request timeout");
        assert_eq!(body["details"], "timeout of 30ms exceeded");
        assert!(body.get("timestamp").is_none());
        assert!(body.get("status").is_none());
    }
}
