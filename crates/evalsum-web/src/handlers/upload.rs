use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};

use evalsum_core::SummaryInput;
use evalsum_pdf::cleaner::truncate;

use crate::error::ApiError;
use crate::models::SummaryResponse;
use crate::state::AppState;
use crate::upload::{multipart_rejection, parse_multipart};

/// Extract text on the server, then summarize it.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let multipart =
        multipart.map_err(|r| multipart_rejection(r, state.config.max_upload_bytes))?;
    let form = parse_multipart(
        multipart,
        state.config.upload_dir.as_deref(),
        state.config.max_upload_bytes,
    )
    .await?;
    let (api_key, file) = form.validate()?;
    let doc = file.into_document().await?;
    let filename = doc.original_filename().to_string();
    tracing::info!(filename = %filename, size_bytes = doc.size_bytes(), "upload received");

    // Parsers are synchronous and can be slow on large files.
    let pipeline = Arc::clone(&state.pipeline);
    let extraction = tokio::task::spawn_blocking(move || pipeline.run(doc.bytes()))
        .await
        .map_err(|e| ApiError::Internal(format!("Extraction task failed: {}", e)))??;

    tracing::info!(
        filename = %filename,
        backend = %extraction.winning_backend,
        attempts = extraction.attempts.len(),
        cleaned_chars = extraction.cleaned_text.chars().count(),
        "extraction complete"
    );

    let forwarded = truncate(&extraction.cleaned_text, state.config.summary_text_chars);
    let result = state
        .summarizer
        .summarize(SummaryInput::Text(&forwarded), &api_key)
        .await?;
    Ok(Json(SummaryResponse { result }))
}
