use once_cell::sync::Lazy;
use regex::Regex;

use evalsum_core::{BackendError, ExtractionBackend};

use crate::text_processing::{is_meaningful_literal, latin1_decode, unescape_literal};

static TEXT_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)BT\s*(.*?)\s*ET").unwrap());
static SHOW_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(((?:\\.|[^\\)])+)\)\s*Tj").unwrap());

/// Scans `BT ... ET` text objects for `(...) Tj` operands only. Narrower
/// than [`LiteralScanBackend`](super::LiteralScanBackend): it ignores
/// metadata and stray literals, one text object per output line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextObjectScanBackend;

impl ExtractionBackend for TextObjectScanBackend {
    fn name(&self) -> &str {
        "text-object-scan"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, BackendError> {
        let content = latin1_decode(bytes);
        let mut lines = Vec::new();
        for block in TEXT_OBJECT.captures_iter(&content) {
            let shown: Vec<String> = SHOW_TEXT
                .captures_iter(&block[1])
                .map(|cap| unescape_literal(&cap[1]))
                .filter(|s| is_meaningful_literal(s))
                .collect();
            if !shown.is_empty() {
                lines.push(shown.join(" "));
            }
        }
        Ok(lines.join("\n"))
    }
}
