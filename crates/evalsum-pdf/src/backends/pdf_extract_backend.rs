use evalsum_core::{BackendError, ExtractionBackend};

use super::catch_panic;

/// `pdf-extract` layout-aware extraction. The crate can panic on malformed
/// fonts, so every call is unwound-guarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractBackend;

impl ExtractionBackend for PdfExtractBackend {
    fn name(&self) -> &str {
        "pdf-extract"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, BackendError> {
        catch_panic(|| {
            pdf_extract::extract_text_from_mem(bytes)
                .map_err(|e| BackendError::Parse(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_an_error_not_a_panic() {
        let result = PdfExtractBackend.extract(b"%PDF-1.4\nthis is not a pdf");
        assert!(result.is_err());
    }
}
