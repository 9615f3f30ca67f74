//! Extraction backend trait shared by every text-extraction strategy.

pub mod mock;

use thiserror::Error;

/// Why a single backend could not produce text.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The document could not be parsed by this backend.
    #[error("parse error: {0}")]
    Parse(String),
    /// The backend panicked; the panic was caught and contained.
    #[error("backend panicked: {0}")]
    Panicked(String),
    /// Output was produced but judged unusable (e.g. binary noise).
    #[error("rejected output: {0}")]
    Rejected(String),
}

/// A strategy that turns raw PDF bytes into text.
///
/// Implementations are stateless and must not panic across this boundary for
/// recoverable problems; the pipeline still guards against panics it can catch.
pub trait ExtractionBackend: Send + Sync {
    /// Stable short name used in logs and attempt records (e.g. "lopdf").
    fn name(&self) -> &str;

    /// Extract text from a complete PDF buffer.
    fn extract(&self, bytes: &[u8]) -> Result<String, BackendError>;
}

impl<T: ExtractionBackend + ?Sized> ExtractionBackend for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, BackendError> {
        (**self).extract(bytes)
    }
}

impl<T: ExtractionBackend + ?Sized> ExtractionBackend for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, BackendError> {
        (**self).extract(bytes)
    }
}
