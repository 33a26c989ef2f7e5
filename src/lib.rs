//! Single-endpoint relay that forwards uploaded images to an OCR service and
//! normalizes whatever comes back into a JSON response.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

use crate::{config::RelayConfig, services::upstream::Upstream};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared, immutable state handed to every request.
#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<RelayConfig>,
    pub upstream: Arc<dyn Upstream>,
}

impl RelayState {
    pub fn new(config: RelayConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            config: Arc::new(config),
            upstream,
        }
    }
}

/// Build the full application: routes, CORS and request tracing.
pub fn create_app(state: RelayState, allowed_origins: &[String]) -> Router {
    routes::routes::routes(state.config.max_file_size)
        .layer(routes::routes::cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
