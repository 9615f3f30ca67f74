//! Text-extraction strategies, from structured parsing down to raw byte scans.

mod literal_scan;
mod lopdf_backend;
mod pdf_extract_backend;
mod text_object_scan;

use std::panic::{AssertUnwindSafe, catch_unwind};

use evalsum_core::{BackendError, ExtractionBackend};

pub use literal_scan::LiteralScanBackend;
pub use lopdf_backend::{LopdfBackend, LopdfPerPageBackend};
pub use pdf_extract_backend::PdfExtractBackend;
pub use text_object_scan::TextObjectScanBackend;

/// Backends in priority order: most reliable first.
pub fn default_backends() -> Vec<Box<dyn ExtractionBackend>> {
    vec![
        Box::new(PdfExtractBackend),
        Box::new(LopdfBackend),
        Box::new(LopdfPerPageBackend),
        Box::new(LiteralScanBackend::default()),
        Box::new(TextObjectScanBackend),
    ]
}

/// Run `f`, turning a panic into [`BackendError::Panicked`].
pub(crate) fn catch_panic<T>(
    f: impl FnOnce() -> Result<T, BackendError>,
) -> Result<T, BackendError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(BackendError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order() {
        let names: Vec<String> = default_backends()
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(
            names,
            [
                "pdf-extract",
                "lopdf",
                "lopdf-per-page",
                "literal-scan",
                "text-object-scan"
            ]
        );
    }

    #[test]
    fn panics_become_errors() {
        let result: Result<(), _> = catch_panic(|| panic!("boom"));
        match result {
            Err(BackendError::Panicked(msg)) => assert_eq!(msg, "boom"),
            other => panic!("expected Panicked, got {:?}", other),
        }
        let formatted: Result<(), _> = catch_panic(|| panic!("bad object {}", 7));
        assert!(matches!(formatted, Err(BackendError::Panicked(m)) if m == "bad object 7"));
    }
}
