use thiserror::Error;

pub mod backends;
pub mod cleaner;
pub mod compress;
pub mod config;
pub mod diagnostics;
pub mod pipeline;
pub mod text_processing;

pub use cleaner::{TRUNCATION_MARKER, TextCleaner};
pub use compress::{compress_pdf, maybe_compress};
pub use config::{CleanerConfig, CleanerConfigBuilder, CleanerConfigError, ListOverride};
pub use diagnostics::{LikelyCause, PdfDiagnostics};
pub use pipeline::ExtractionPipeline;
// Re-export domain types from core (canonical definitions live there)
pub use evalsum_core::{CompressionInfo, ExtractionAttempt, ExtractionResult, ProgressEvent};

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("not a PDF file (missing %PDF signature)")]
    InvalidFormat,
    #[error("could not extract text from the PDF ({} backends tried)", .attempts.len())]
    ExtractionExhausted {
        attempts: Vec<ExtractionAttempt>,
        diagnostics: PdfDiagnostics,
    },
    #[error("PDF compression failed: {0}")]
    Compression(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extract and clean text from a PDF buffer with the default pipeline.
pub fn extract_text(bytes: &[u8]) -> Result<ExtractionResult, PdfError> {
    ExtractionPipeline::new().run(bytes)
}
