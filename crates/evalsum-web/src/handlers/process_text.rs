use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use evalsum_core::{SummaryInput, credential};
use evalsum_pdf::cleaner::truncate;

use super::json_rejection;
use crate::error::ApiError;
use crate::models::{ProcessTextRequest, SummaryResponse};
use crate::state::AppState;
use crate::upload::API_KEY_REQUIRED;

const NO_TEXT: &str =
    "No text provided. This might be a scanned document or contain only images.";

/// Summarize text the client already extracted.
pub async fn process_text(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProcessTextRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let Json(req) = body.map_err(|r| json_rejection(r, state.config.max_upload_bytes))?;
    let text = req.text.unwrap_or_default();
    let filename = req.filename.as_deref().unwrap_or("unknown");
    tracing::info!(filename, text_chars = text.chars().count(), "process-text request");

    let api_key = match req.api_key {
        Some(key) if credential::is_well_formed(&key) => key,
        _ => return Err(ApiError::InvalidCredential(API_KEY_REQUIRED)),
    };
    if text.trim().is_empty() {
        return Err(ApiError::InvalidUpload(NO_TEXT.to_string()));
    }

    let forwarded = truncate(&text, state.config.max_text_chars);
    if forwarded.len() != text.len() {
        tracing::info!(
            filename,
            max_chars = state.config.max_text_chars,
            "truncated text before summarizing"
        );
    }

    let result = state
        .summarizer
        .summarize(SummaryInput::Text(&forwarded), &api_key)
        .await?;
    tracing::info!(filename, summary_chars = result.chars().count(), "summary complete");
    Ok(Json(SummaryResponse { result }))
}
