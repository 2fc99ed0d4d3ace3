//! Invoice upload endpoint.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn, Instrument};

use super::super::error::{ApiError, ApiResponse};
use super::super::AppState;
use crate::extract::{extension_of, ExtractionOutcome};
use crate::invoice::interpret_model_output;
use crate::llm::StructuringOutcome;

/// Multipart field carrying the document.
const FILE_FIELD: &str = "file";

/// A document read from the request, before any validation besides size.
struct UploadedDocument {
    filename: String,
    content: Vec<u8>,
}

impl UploadedDocument {
    /// Short content fingerprint for logs.
    fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.content);
        hex::encode(&digest[..8])
    }
}

/// `POST /api/process-invoice`: extract text from the uploaded file and
/// structure it with the model.
pub async fn process_invoice(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("process_invoice", %request_id);
    let timeout = state.settings.request_timeout;

    let pipeline = async move {
        let multipart = multipart?;
        run_pipeline(&state, multipart).await
    }
    .instrument(span);

    match tokio::time::timeout(timeout, pipeline).await {
        Ok(Ok(data)) => Ok(Json(ApiResponse::ok(data))),
        Ok(Err(e)) => {
            debug!("Request {} rejected: {}", request_id, e);
            Err(e)
        }
        Err(_) => {
            warn!(
                "Request {} exceeded {}s timeout",
                request_id,
                timeout.as_secs()
            );
            Err(ApiError::Timeout)
        }
    }
}

async fn run_pipeline(
    state: &AppState,
    multipart: Multipart,
) -> Result<serde_json::Value, ApiError> {
    let settings = &state.settings;
    let upload = read_upload(multipart, settings.max_upload_bytes).await?;

    let extension = extension_of(&upload.filename).unwrap_or_default();
    info!(
        "Received {:?} ({} bytes, extension {:?}, sha256 {})",
        upload.filename,
        upload.content.len(),
        extension,
        upload.fingerprint()
    );

    if !settings.is_allowed_extension(&extension) {
        return Err(ApiError::UnsupportedType {
            allowed: settings.allowed_extensions.clone(),
        });
    }

    let extractor = state.extractor.clone();
    let UploadedDocument { filename, content } = upload;
    let outcome = tokio::task::spawn_blocking(move || extractor.extract(&filename, &content))
        .await
        .map_err(|e| {
            error!("Extraction task panicked or was cancelled: {}", e);
            ApiError::Internal
        })?;

    let result = match outcome {
        Ok(ExtractionOutcome::Extracted(result)) => result,
        Ok(ExtractionOutcome::Unsupported { .. }) => {
            return Err(ApiError::UnsupportedType {
                allowed: settings.allowed_extensions.clone(),
            });
        }
        Err(e) if e.is_client_error() => {
            warn!("Rejected upload: {}", e);
            return Err(ApiError::BadRequest(e.to_string()));
        }
        Err(e) => {
            error!("Extraction failed: {}", e);
            return Err(ApiError::Internal);
        }
    };

    if result.is_blank() {
        return Err(ApiError::NoText);
    }

    match state.structurer.structure(&result.text).await {
        StructuringOutcome::Structured(output) => Ok(interpret_model_output(&output)),
        StructuringOutcome::Failed(message) => {
            error!("Structuring failed: {}", message);
            Err(ApiError::Internal)
        }
    }
}

/// Read the `file` field, enforcing the size limit while streaming.
async fn read_upload(
    mut multipart: Multipart,
    max_bytes: usize,
) -> Result<UploadedDocument, ApiError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from_multipart(e, max_bytes))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let mut content = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::from_multipart(e, max_bytes))?
        {
            if content.len() + chunk.len() > max_bytes {
                warn!("Upload {:?} exceeds {} bytes", filename, max_bytes);
                return Err(ApiError::TooLarge { max_bytes });
            }
            content.extend_from_slice(&chunk);
        }

        return Ok(UploadedDocument { filename, content });
    }

    Err(ApiError::BadRequest(format!(
        "Missing '{}' field in multipart form",
        FILE_FIELD
    )))
}
