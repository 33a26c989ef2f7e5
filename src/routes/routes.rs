//! Defines routes for the relay service.
//!
//! ## Structure
//! - `POST /api/ocr`  — relay an uploaded image to the OCR service
//! - `GET  /healthz`  — liveness
//! - `GET  /`         — service info
//!
//! Unknown paths fall through to a JSON 404.

use crate::{
    RelayState,
    handlers::{
        health_handlers::{healthz, not_found, service_info},
        ocr_handlers::process_ocr,
    },
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Headroom on top of the file cap for multipart boundaries and part headers.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Build and return the router for all relay routes.
///
/// The upload route carries a body limit derived from `max_file_size`; the
/// exact per-file cap is enforced while reading the part.
pub fn routes(max_file_size: usize) -> Router<RelayState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(service_info))
        .route(
            "/api/ocr",
            post(process_ocr).layer(DefaultBodyLimit::max(
                max_file_size.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .fallback(not_found)
}

/// CORS layer admitting the configured origins. A `*` entry allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Ignoring invalid CORS origin {:?}: {}", origin, err);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
