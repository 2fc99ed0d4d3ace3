//! API errors and the JSON envelope every response shares.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const MIB: usize = 1024 * 1024;

/// Response body for the invoice endpoint: `{success, data, error}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Request failures, each mapped to a status code and a client-facing message.
///
/// Server-side variants carry no detail. The cause is logged where the
/// error is raised.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("File too large. Max size is {}", describe_limit(.max_bytes))]
    TooLarge { max_bytes: usize },

    #[error("Unsupported file type. Allowed types: {}", .allowed.join(", "))]
    UnsupportedType { allowed: Vec<String> },

    #[error("Could not extract text from the provided file")]
    NoText,

    #[error("Error processing invoice")]
    Internal,

    #[error("Request timed out")]
    Timeout,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::UnsupportedType { .. } | Self::NoText => {
                StatusCode::BAD_REQUEST
            }
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Map a multipart read failure. Bodies cut off by the router's body
    /// limit surface here as 413.
    pub fn from_multipart(err: MultipartError, max_bytes: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::TooLarge { max_bytes }
        } else {
            Self::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ApiResponse::failure(self.to_string()))).into_response()
    }
}

fn describe_limit(max_bytes: &usize) -> String {
    let max_bytes = *max_bytes;
    if max_bytes >= MIB && max_bytes % MIB == 0 {
        format!("{}MB", max_bytes / MIB)
    } else {
        format!("{} bytes", max_bytes)
    }
}
