use lopdf::Document;

use evalsum_core::{BackendError, ExtractionBackend};

use super::catch_panic;
use crate::text_processing::collapse_line_whitespace;

fn load(bytes: &[u8]) -> Result<Document, BackendError> {
    Document::load_mem(bytes).map_err(|e| BackendError::Parse(e.to_string()))
}

/// Whole-document extraction through `lopdf`, all pages in one call.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBackend;

impl ExtractionBackend for LopdfBackend {
    fn name(&self) -> &str {
        "lopdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, BackendError> {
        catch_panic(|| {
            let doc = load(bytes)?;
            let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
            if pages.is_empty() {
                return Err(BackendError::Parse("document has no pages".into()));
            }
            let text = doc
                .extract_text(&pages)
                .map_err(|e| BackendError::Parse(e.to_string()))?;
            Ok(collapse_line_whitespace(&text))
        })
    }
}

/// Page-by-page `lopdf` extraction. Pages that fail are skipped, so one bad
/// page does not lose the rest of the document.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfPerPageBackend;

impl ExtractionBackend for LopdfPerPageBackend {
    fn name(&self) -> &str {
        "lopdf-per-page"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, BackendError> {
        let doc = catch_panic(|| load(bytes))?;
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        if pages.is_empty() {
            return Err(BackendError::Parse("document has no pages".into()));
        }
        let mut sections = Vec::new();
        for page in pages {
            match catch_panic(|| {
                doc.extract_text(&[page])
                    .map_err(|e| BackendError::Parse(e.to_string()))
            }) {
                Ok(text) => {
                    let text = collapse_line_whitespace(&text);
                    let text = text.trim();
                    if !text.is_empty() {
                        sections.push(format!("--- Page {} ---\n{}", page, text));
                    }
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "skipping page that failed to extract");
                }
            }
        }
        Ok(sections.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsable_bytes_error() {
        assert!(LopdfBackend.extract(b"%PDF-1.4\n%%EOF").is_err());
        assert!(LopdfPerPageBackend.extract(b"%PDF-1.4\n%%EOF").is_err());
    }
}
