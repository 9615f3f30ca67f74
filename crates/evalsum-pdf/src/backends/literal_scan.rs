use once_cell::sync::Lazy;
use regex::Regex;

use evalsum_core::{BackendError, ExtractionBackend};

use crate::text_processing::{
    clean_char_ratio, is_meaningful_literal, latin1_decode, unescape_literal,
};

/// A PDF string literal, honoring backslash escapes.
pub(crate) static LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(((?:\\.|[^\\)])+)\)").unwrap());

pub const DEFAULT_MIN_CLEAN_RATIO: f64 = 0.7;

/// Scans the raw bytes for every `( ... )` string literal, wherever it
/// appears. Catches text in uncompressed content streams that the parsers
/// choke on, but also picks up metadata and binary noise, so output that is
/// mostly non-prose characters is rejected.
#[derive(Debug, Clone, Copy)]
pub struct LiteralScanBackend {
    min_clean_ratio: f64,
}

impl Default for LiteralScanBackend {
    fn default() -> Self {
        Self {
            min_clean_ratio: DEFAULT_MIN_CLEAN_RATIO,
        }
    }
}

impl LiteralScanBackend {
    pub fn with_min_clean_ratio(ratio: f64) -> Self {
        Self {
            min_clean_ratio: ratio,
        }
    }
}

impl ExtractionBackend for LiteralScanBackend {
    fn name(&self) -> &str {
        "literal-scan"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, BackendError> {
        let content = latin1_decode(bytes);
        let literals: Vec<String> = LITERAL
            .captures_iter(&content)
            .map(|cap| unescape_literal(&cap[1]))
            .filter(|s| is_meaningful_literal(s))
            .collect();
        let text = literals.join(" ");

        let ratio = clean_char_ratio(&text);
        if ratio < self.min_clean_ratio {
            return Err(BackendError::Rejected(format!(
                "output looks like binary noise ({:.0}% readable)",
                ratio * 100.0
            )));
        }
        Ok(text)
    }
}
