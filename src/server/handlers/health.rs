//! Liveness endpoints.

use axum::{response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// RFC 3339, UTC, whole seconds.
    pub timestamp: String,
}

/// Banner for the root path.
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Invoice Processing API is running" }))
}

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}
