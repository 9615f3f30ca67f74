use std::io::Write;
use std::path::Path;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::http::StatusCode;
use tempfile::NamedTempFile;

use evalsum_core::{SourceDocument, credential, is_pdf_upload};

use crate::error::ApiError;

pub const API_KEY_REQUIRED: &str = "Valid Anthropic API key required";

/// An uploaded file spooled to disk. The temp file is removed when this is
/// dropped, on every exit path of the request that owns it.
#[derive(Debug)]
pub struct SpooledFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub size_bytes: usize,
    file: NamedTempFile,
}

impl SpooledFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the spooled bytes back into a [`SourceDocument`].
    pub async fn into_document(self) -> Result<SourceDocument, ApiError> {
        let bytes = tokio::fs::read(self.file.path())
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to read uploaded file: {}", e)))?;
        Ok(SourceDocument::new(bytes, self.filename, self.mime_type))
    }
}

/// Parsed form fields from the multipart upload.
pub struct UploadForm {
    pub api_key: Option<String>,
    pub file: Option<SpooledFile>,
}

impl UploadForm {
    /// Check the credential, then file presence, then file type.
    pub fn validate(self) -> Result<(String, SpooledFile), ApiError> {
        let api_key = match self.api_key {
            Some(key) if credential::is_well_formed(&key) => key,
            _ => return Err(ApiError::InvalidCredential(API_KEY_REQUIRED)),
        };
        let file = self
            .file
            .ok_or_else(|| ApiError::InvalidUpload("No file uploaded".to_string()))?;
        if !is_pdf_upload(&file.filename, file.mime_type.as_deref()) {
            return Err(ApiError::InvalidUpload("Please upload a PDF file".to_string()));
        }
        Ok((api_key, file))
    }
}

/// Parse a multipart form, streaming the `file` field into a temp file.
pub async fn parse_multipart(
    mut multipart: Multipart,
    upload_dir: Option<&Path>,
    max_bytes: usize,
) -> Result<UploadForm, ApiError> {
    let mut api_key: Option<String> = None;
    let mut file: Option<SpooledFile> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload.pdf").to_string();
                let mime_type = field.content_type().map(str::to_string);
                let mut temp = create_temp(upload_dir)?;
                let mut size_bytes = 0usize;

                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| multipart_error(e, max_bytes))?
                {
                    size_bytes += chunk.len();
                    if size_bytes > max_bytes {
                        return Err(ApiError::payload_too_large(max_bytes));
                    }
                    temp.write_all(&chunk).map_err(|e| {
                        ApiError::Internal(format!("Failed to write temp file: {}", e))
                    })?;
                }

                tracing::debug!(
                    filename = %filename,
                    size_bytes,
                    path = %temp.path().display(),
                    "spooled upload"
                );
                file = Some(SpooledFile {
                    filename,
                    mime_type,
                    size_bytes,
                    file: temp,
                });
            }
            "apiKey" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_bytes))?;
                if !val.is_empty() {
                    api_key = Some(val);
                }
            }
            _ => {
                // Ignore unknown fields
                let _ = field.bytes().await;
            }
        }
    }

    Ok(UploadForm { api_key, file })
}

fn create_temp(upload_dir: Option<&Path>) -> Result<NamedTempFile, ApiError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("evalsum-").suffix(".pdf");
    match upload_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| ApiError::Internal(format!("Failed to create temp file: {}", e)))
}

/// Map a failure to start reading the form (wrong content type, body limit).
pub fn multipart_rejection(r: MultipartRejection, max_bytes: usize) -> ApiError {
    if r.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(max_bytes)
    } else {
        ApiError::InvalidUpload(r.body_text())
    }
}

fn multipart_error(e: MultipartError, max_bytes: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(max_bytes)
    } else {
        ApiError::InvalidUpload(format!("Failed to read form field: {}", e.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spooled(filename: &str, mime: Option<&str>) -> SpooledFile {
        SpooledFile {
            filename: filename.to_string(),
            mime_type: mime.map(str::to_string),
            size_bytes: 0,
            file: NamedTempFile::new().unwrap(),
        }
    }

    const KEY: &str = "sk-ant-REDACTED";

    #[test]
    fn credential_is_checked_first() {
        let form = UploadForm {
            api_key: Some("sk-ant-short".to_string()),
            file: None,
        };
        let err = form.validate().unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredential(API_KEY_REQUIRED)));
    }

    #[test]
    fn missing_file() {
        let form = UploadForm {
            api_key: Some(KEY.to_string()),
            file: None,
        };
        assert_eq!(form.validate().unwrap_err().to_string(), "No file uploaded");
    }

    #[test]
    fn wrong_type() {
        let form = UploadForm {
            api_key: Some(KEY.to_string()),
            file: Some(spooled("notes.docx", Some("application/msword"))),
        };
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Please upload a PDF file"
        );
    }

    #[test]
    fn pdf_by_mime_or_extension() {
        for (name, mime) in [("eval.PDF", None), ("blob", Some("application/pdf"))] {
            let form = UploadForm {
                api_key: Some(KEY.to_string()),
                file: Some(spooled(name, mime)),
            };
            let (key, file) = form.validate().unwrap();
            assert_eq!(key, KEY);
            assert_eq!(file.filename, name);
        }
    }

    #[tokio::test]
    async fn temp_file_removed_on_drop() {
        let file = spooled("eval.pdf", None);
        let path = file.path().to_path_buf();
        assert!(path.exists());
        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn into_document_reads_back_bytes() {
        let mut file = spooled("eval.pdf", Some("application/pdf"));
        file.file.write_all(b"%PDF-1.4 body").unwrap();
        let path = file.path().to_path_buf();
        let doc = file.into_document().await.unwrap();
        assert_eq!(doc.bytes(), b"%PDF-1.4 body");
        assert_eq!(doc.original_filename(), "eval.pdf");
        assert_eq!(doc.mime_type(), Some("application/pdf"));
        assert!(!path.exists());
    }
}
