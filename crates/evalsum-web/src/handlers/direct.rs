use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};

use evalsum_core::SummaryInput;
use evalsum_pdf::PdfError;

use crate::error::ApiError;
use crate::models::SummaryResponse;
use crate::state::AppState;
use crate::upload::{multipart_rejection, parse_multipart};

/// Send the whole PDF to the model as a document, skipping extraction.
pub async fn process_pdf_direct(
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
    if !doc.has_pdf_signature() {
        return Err(PdfError::InvalidFormat.into());
    }

    if doc.size_bytes() > state.config.direct_warn_bytes {
        tracing::warn!(
            filename = %doc.original_filename(),
            size_bytes = doc.size_bytes(),
            recommended_max = state.config.direct_warn_bytes,
            "document is larger than recommended for direct mode"
        );
    } else {
        tracing::info!(
            filename = %doc.original_filename(),
            size_bytes = doc.size_bytes(),
            "direct document received"
        );
    }

    let result = state
        .summarizer
        .summarize(
            SummaryInput::Document {
                bytes: doc.bytes(),
                filename: doc.original_filename(),
            },
            &api_key,
        )
        .await?;
    Ok(Json(SummaryResponse { result }))
}
