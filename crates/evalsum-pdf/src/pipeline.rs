use std::time::Instant;

use evalsum_core::{
    Config, ExtractionAttempt, ExtractionBackend, ExtractionResult, PDF_SIGNATURE, ProgressEvent,
};

use crate::PdfError;
use crate::backends::{catch_panic, default_backends};
use crate::cleaner::TextCleaner;
use crate::config::{CleanerConfigBuilder, CleanerConfigError};
use crate::diagnostics::PdfDiagnostics;

pub const DEFAULT_MIN_TEXT_CHARS: usize = 100;

/// Share of the progress range used by the backends; the rest is cleaning.
const BACKEND_PROGRESS_SPAN: usize = 90;
const CLEANING_PROGRESS: u8 = 95;

/// An ordered, fault-tolerant text extraction pipeline.
///
/// Backends run strictly in order and the first one whose output clears the
/// threshold wins; later backends are never invoked and outputs are never
/// merged. Backend failures (errors or panics) are recorded as attempts and
/// never abort the run.
pub struct ExtractionPipeline {
    backends: Vec<Box<dyn ExtractionBackend>>,
    cleaner: TextCleaner,
    min_text_chars: usize,
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionPipeline {
    /// Default backends and cleaner.
    pub fn new() -> Self {
        Self::with_backends(default_backends(), TextCleaner::new())
    }

    pub fn with_backends(
        backends: Vec<Box<dyn ExtractionBackend>>,
        cleaner: TextCleaner,
    ) -> Self {
        Self {
            backends,
            cleaner,
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
        }
    }

    /// Default backends with a custom cleaner.
    pub fn with_cleaner(cleaner: TextCleaner) -> Self {
        Self::with_backends(default_backends(), cleaner)
    }

    /// Default backends, with the threshold and cleaner settings from `config`.
    pub fn from_config(config: &Config) -> Result<Self, CleanerConfigError> {
        let cleaner = TextCleaner::with_config(CleanerConfigBuilder::from_config(config).build()?);
        Ok(Self::with_cleaner(cleaner).min_text_chars(config.min_text_chars))
    }

    /// Output must have strictly more than `n` trimmed characters to be accepted.
    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.min_text_chars = n;
        self
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn cleaner(&self) -> &TextCleaner {
        &self.cleaner
    }

    pub fn run(&self, bytes: &[u8]) -> Result<ExtractionResult, PdfError> {
        self.run_with_progress(bytes, |_| {})
    }

    /// Run the pipeline, reporting progress to `progress`.
    ///
    /// Percentages never decrease and the final event is always
    /// [`ProgressEvent::Finished`].
    pub fn run_with_progress(
        &self,
        bytes: &[u8],
        mut progress: impl FnMut(ProgressEvent),
    ) -> Result<ExtractionResult, PdfError> {
        if !bytes.starts_with(PDF_SIGNATURE) {
            tracing::warn!(size_bytes = bytes.len(), "rejecting input without %PDF signature");
            progress(ProgressEvent::Finished { success: false });
            return Err(PdfError::InvalidFormat);
        }

        let total = self.backends.len();
        let mut attempts = Vec::with_capacity(total);

        for (index, backend) in self.backends.iter().enumerate() {
            let name = backend.name().to_string();
            progress(ProgressEvent::BackendStarted {
                backend: name.clone(),
                index,
                total,
                percent: step_percent(index, total),
            });

            let start = Instant::now();
            let outcome = catch_panic(|| backend.extract(bytes));
            let elapsed = start.elapsed();

            let (extracted_len, rejection, accepted) = match outcome {
                Err(e) => (0, Some(e.to_string()), None),
                Ok(raw) => {
                    let extracted_len = raw.trim().chars().count();
                    if extracted_len <= self.min_text_chars {
                        let reason = format!(
                            "below threshold ({} <= {} chars)",
                            extracted_len, self.min_text_chars
                        );
                        (extracted_len, Some(reason), None)
                    } else {
                        let cleaned = self.cleaner.clean(&raw);
                        if cleaned.is_empty() {
                            let reason = "no text left after cleaning".to_string();
                            (extracted_len, Some(reason), None)
                        } else {
                            (extracted_len, None, Some((raw, cleaned)))
                        }
                    }
                }
            };

            tracing::info!(
                backend = %name,
                accepted = accepted.is_some(),
                extracted_len,
                reason = rejection.as_deref().unwrap_or(""),
                elapsed_ms = elapsed.as_millis() as u64,
                "extraction attempt"
            );

            attempts.push(ExtractionAttempt {
                backend: name.clone(),
                succeeded: accepted.is_some(),
                extracted_len,
                error: rejection.clone(),
                elapsed,
            });

            match accepted {
                Some((raw_text, cleaned_text)) => {
                    progress(ProgressEvent::BackendAccepted {
                        backend: name.clone(),
                        extracted_len,
                        percent: BACKEND_PROGRESS_SPAN as u8,
                    });
                    progress(ProgressEvent::Cleaning {
                        percent: CLEANING_PROGRESS,
                    });
                    progress(ProgressEvent::Finished { success: true });
                    return Ok(ExtractionResult {
                        raw_text,
                        cleaned_text,
                        winning_backend: name,
                        attempts,
                    });
                }
                None => progress(ProgressEvent::BackendRejected {
                    backend: name,
                    reason: rejection.unwrap_or_default(),
                    percent: step_percent(index + 1, total),
                }),
            }
        }

        let diagnostics = PdfDiagnostics::from_bytes(bytes);
        tracing::warn!(
            attempts = attempts.len(),
            diagnostics = %diagnostics,
            "all extraction backends failed"
        );
        progress(ProgressEvent::Finished { success: false });
        Err(PdfError::ExtractionExhausted {
            attempts,
            diagnostics,
        })
    }
}

fn step_percent(step: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (step.min(total) * BACKEND_PROGRESS_SPAN / total) as u8
}
