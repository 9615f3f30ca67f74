//! Byte-level heuristics explaining why no backend found text.

use std::fmt;

/// Raw facts about a PDF buffer, gathered after every backend failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfDiagnostics {
    pub size_bytes: usize,
    /// Contains at least one `stream` keyword.
    pub has_stream: bool,
    /// Contains a `BT` (begin text) operator.
    pub has_bt: bool,
    /// Contains a `Tj` (show text) operator.
    pub has_tj: bool,
    /// Has an `/Encrypt` dictionary.
    pub has_encrypt: bool,
    /// Number of `(` bytes, a rough count of string literals.
    pub paren_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikelyCause {
    Encrypted,
    /// Streams but no text operators: pages are images.
    ScannedImages,
    /// Text operators exist, probably inside compressed streams or custom encodings.
    UnreadableText,
    /// No content streams at all.
    NoContent,
}

impl LikelyCause {
    pub fn message(&self) -> &'static str {
        match self {
            LikelyCause::Encrypted => "The PDF is encrypted or password-protected.",
            LikelyCause::ScannedImages => {
                "This might be a scanned document or contain only images."
            }
            LikelyCause::UnreadableText => {
                "The PDF contains text, but in an encoding that could not be decoded."
            }
            LikelyCause::NoContent => "The PDF has no content streams; it may be empty or corrupt.",
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

impl PdfDiagnostics {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            size_bytes: bytes.len(),
            has_stream: contains(bytes, b"stream"),
            has_bt: contains(bytes, b"BT"),
            has_tj: contains(bytes, b"Tj") || contains(bytes, b"TJ"),
            has_encrypt: contains(bytes, b"/Encrypt"),
            paren_count: bytes.iter().filter(|&&b| b == b'(').count(),
        }
    }

    pub fn likely_cause(&self) -> LikelyCause {
        if self.has_encrypt {
            LikelyCause::Encrypted
        } else if !self.has_stream {
            LikelyCause::NoContent
        } else if self.has_bt || self.has_tj {
            LikelyCause::UnreadableText
        } else {
            LikelyCause::ScannedImages
        }
    }
}

impl fmt::Display for PdfDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes, streams: {}, BT: {}, Tj: {}, encrypted: {}, string literals: {}. {}",
            self.size_bytes,
            yes_no(self.has_stream),
            yes_no(self.has_bt),
            yes_no(self.has_tj),
            yes_no(self.has_encrypt),
            self.paren_count,
            self.likely_cause().message()
        )
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}
