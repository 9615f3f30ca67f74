use std::any::Any;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use evalsum_core::UpstreamError;
use evalsum_pdf::PdfError;

/// Every failure a handler can report, with its HTTP mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failed the local key format check.
    #[error("{0}")]
    InvalidCredential(&'static str),
    /// The summarization service refused the key.
    #[error("{0}")]
    RejectedCredential(&'static str),
    #[error("{0}")]
    InvalidUpload(String),
    #[error("File too large. Maximum upload size is {limit_mb}MB.")]
    PayloadTooLarge { limit_mb: usize },
    #[error("No text found in PDF")]
    Extraction { details: String },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredential(_)
            | ApiError::InvalidUpload(_)
            | ApiError::Extraction { .. } => StatusCode::BAD_REQUEST,
            ApiError::RejectedCredential(_) => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream(UpstreamError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(UpstreamError::Oversized) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn payload_too_large(limit_bytes: usize) -> Self {
        ApiError::PayloadTooLarge {
            limit_mb: limit_bytes / (1024 * 1024),
        }
    }
}

impl From<PdfError> for ApiError {
    fn from(e: PdfError) -> Self {
        match e {
            PdfError::InvalidFormat => {
                ApiError::InvalidUpload("File does not appear to be a valid PDF".to_string())
            }
            PdfError::ExtractionExhausted { diagnostics, .. } => ApiError::Extraction {
                details: diagnostics.to_string(),
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::InvalidCredential(_) | ApiError::RejectedCredential(_) => {
                json!({ "error": self.to_string(), "valid": false })
            }
            ApiError::Extraction { details } => {
                json!({ "error": self.to_string(), "details": details })
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "unhandled request failure");
                json!({ "error": self.to_string() })
            }
            _ => json!({ "error": self.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::Upstream(UpstreamError::RateLimited {
            retry_after: Some(wait),
        }) = &self
        {
            if let Ok(value) = HeaderValue::from_str(&wait.as_secs().max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Turn a handler panic into the generic 500 body.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}
