use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use evalsum_core::credential::{self, KeyCheck};

use super::json_rejection;
use crate::error::ApiError;
use crate::models::{TestKeyRequest, TestKeyResponse};
use crate::state::AppState;

const MALFORMED_KEY: &str = "Please provide a valid Anthropic API key (starts with sk-ant-)";
const REJECTED_KEY: &str = "Invalid API key. Please check your key and try again.";

/// Format check, then a minimal live call. The format check never touches
/// the network.
pub async fn test_key(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TestKeyRequest>, JsonRejection>,
) -> Result<Json<TestKeyResponse>, ApiError> {
    let Json(req) = body.map_err(|r| json_rejection(r, state.config.max_upload_bytes))?;
    let key = req.api_key.unwrap_or_default();

    match credential::check_key(state.summarizer.as_ref(), &key).await {
        KeyCheck::Valid => {
            tracing::info!(key = %credential::redact(&key), "api key validated");
            Ok(Json(TestKeyResponse { valid: true }))
        }
        KeyCheck::Malformed => Err(ApiError::InvalidCredential(MALFORMED_KEY)),
        KeyCheck::Rejected(e) => {
            tracing::info!(key = %credential::redact(&key), error = %e, "api key rejected");
            Err(ApiError::RejectedCredential(REJECTED_KEY))
        }
    }
}
