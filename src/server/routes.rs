//! Router configuration for the web server.

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Allowance for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .settings
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/process-invoice", post(handlers::process_invoice))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
