//! Health and informational handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /         -> service name, version and endpoint list
//! - anything else -> JSON 404

use crate::errors::AppError;
use axum::{Json, http::StatusCode, http::Uri, response::IntoResponse};
use serde::Serialize;

/// `GET /healthz`
///
/// Very small liveness probe; always returns 200 OK with a plain JSON body.
/// It never contacts the upstream.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /`
pub async fn service_info() -> impl IntoResponse {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            EndpointInfo {
                method: "POST",
                path: "/api/ocr",
                description: "Relay an image (multipart field `file`) to the OCR service",
            },
            EndpointInfo {
                method: "GET",
                path: "/healthz",
                description: "Liveness probe",
            },
        ],
    })
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("Route {} not found", uri.path()))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ServiceInfo {
    name: &'static str,
    version: &'static str,
    endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
struct EndpointInfo {
    method: &'static str,
    path: &'static str,
    description: &'static str,
}
