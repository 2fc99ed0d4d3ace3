//! HTTP API for invoice processing.
//!
//! Routes:
//! - `GET /`: banner
//! - `GET /health`: liveness with version and timestamp
//! - `POST /api/process-invoice`: multipart upload, returns the structured invoice

mod error;
mod handlers;
mod routes;

pub use error::{ApiError, ApiResponse};
pub use routes::create_router;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Settings;
use crate::extract::TextExtractor;
use crate::llm::{InvoiceStructurer, LlmClient};

/// Shared state for the web server. Immutable once built.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub extractor: Arc<TextExtractor>,
    pub structurer: Arc<dyn InvoiceStructurer>,
}

impl AppState {
    /// Build state backed by Tesseract and the configured hosted model.
    ///
    /// Fails when no model credential is configured.
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        settings.require_credentials()?;

        let extractor = TextExtractor::from_config(&settings.ocr);
        for (tool, available) in extractor.check_tools() {
            if !available {
                tracing::warn!("{} not available; image uploads will fail", tool);
            }
        }

        let client = LlmClient::new(settings.llm.clone())?;

        Ok(Self::with_components(
            settings.clone(),
            extractor,
            Arc::new(client),
        ))
    }

    /// Build state from explicit components.
    pub fn with_components(
        settings: Settings,
        extractor: TextExtractor,
        structurer: Arc<dyn InvoiceStructurer>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            extractor: Arc::new(extractor),
            structurer,
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let listener = bind_listener(host, port).await?;
    tracing::info!(
        "Starting server at http://{} (model {} via {})",
        listener.local_addr()?,
        settings.llm.model,
        settings.llm.provider
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Bind to an IP address or a hostname such as `localhost`.
async fn bind_listener(host: &str, port: u16) -> anyhow::Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}:{}: {}", host, port, e))
}
