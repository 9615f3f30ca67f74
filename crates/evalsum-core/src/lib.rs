use std::path::PathBuf;
use std::time::Duration;

pub mod backend;
pub mod config_file;
pub mod credential;
pub mod llm;
pub mod rate_limit;
pub mod session;

// Re-export for convenience
pub use backend::{BackendError, ExtractionBackend};
pub use config_file::ConfigFile;
pub use llm::{AnthropicClient, Summarizer, SummaryInput, UpstreamError};
pub use session::{InvalidTransition, ProgressAnimation, SessionEvent, SessionState, Step};

/// Four-byte signature every PDF file starts with.
pub const PDF_SIGNATURE: &[u8; 4] = b"%PDF";

/// An uploaded PDF, owned by a single request or session.
#[derive(Clone)]
pub struct SourceDocument {
    bytes: Vec<u8>,
    original_filename: String,
    mime_type: Option<String>,
}

impl SourceDocument {
    pub fn new(
        bytes: Vec<u8>,
        original_filename: impl Into<String>,
        mime_type: Option<String>,
    ) -> Self {
        Self {
            bytes,
            original_filename: original_filename.into(),
            mime_type,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// True when the buffer is non-empty and begins with `%PDF`.
    pub fn has_pdf_signature(&self) -> bool {
        self.bytes.starts_with(PDF_SIGNATURE)
    }

    /// Upload-level type check: a `.pdf` extension or a PDF mime type.
    pub fn is_pdf_upload(&self) -> bool {
        is_pdf_upload(&self.original_filename, self.mime_type.as_deref())
    }
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("original_filename", &self.original_filename)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// Accept a file when either its name ends in `.pdf` or its declared mime
/// type is `application/pdf`.
pub fn is_pdf_upload(filename: &str, mime_type: Option<&str>) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf") || mime_type == Some("application/pdf")
}

/// Size change produced by PDF compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionInfo {
    pub original_bytes: usize,
    pub compressed_bytes: usize,
}

impl CompressionInfo {
    /// Percentage saved, 0.0 when nothing was saved.
    pub fn ratio(&self) -> f64 {
        if self.original_bytes == 0 || self.compressed_bytes >= self.original_bytes {
            return 0.0;
        }
        (1.0 - self.compressed_bytes as f64 / self.original_bytes as f64) * 100.0
    }
}

/// Outcome of running one extraction backend.
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    pub backend: String,
    /// Whether this attempt was accepted as the pipeline's result.
    pub succeeded: bool,
    /// Trimmed character count of the backend output (0 when it errored).
    pub extracted_len: usize,
    /// Backend error, or the reason the output was rejected.
    pub error: Option<String>,
    pub elapsed: Duration,
}

/// Result of a successful extraction pipeline run.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub raw_text: String,
    pub cleaned_text: String,
    pub winning_backend: String,
    pub attempts: Vec<ExtractionAttempt>,
}

/// Progress events emitted by the extraction pipeline.
///
/// Every variant carries a percentage; across one run the percentages never
/// decrease and the last event is always [`ProgressEvent::Finished`] at 100.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    BackendStarted {
        backend: String,
        index: usize,
        total: usize,
        percent: u8,
    },
    BackendRejected {
        backend: String,
        reason: String,
        percent: u8,
    },
    BackendAccepted {
        backend: String,
        extracted_len: usize,
        percent: u8,
    },
    Cleaning {
        percent: u8,
    },
    Finished {
        success: bool,
    },
}

impl ProgressEvent {
    pub fn percent(&self) -> u8 {
        match self {
            ProgressEvent::BackendStarted { percent, .. }
            | ProgressEvent::BackendRejected { percent, .. }
            | ProgressEvent::BackendAccepted { percent, .. }
            | ProgressEvent::Cleaning { percent } => *percent,
            ProgressEvent::Finished { .. } => 100,
        }
    }
}

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Runtime configuration shared by the server and the CLI.
#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens_text: u32,
    pub max_tokens_document: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    /// Minimum trimmed characters a backend must produce to be accepted.
    pub min_text_chars: usize,
    /// Cap applied by the cleaner and to text posted by clients.
    pub max_text_chars: usize,
    /// Ceiling on text sent to the summarizer after server-side extraction.
    pub summary_text_chars: usize,
    pub comment_sections: bool,
    /// Extra boilerplate line patterns for the cleaner.
    pub extra_boilerplate: Vec<String>,
    pub compress_threshold_bytes: usize,
    pub max_upload_bytes: usize,
    /// Direct-mode uploads above this size are accepted but logged.
    pub direct_warn_bytes: usize,
    pub port: u16,
    pub upload_dir: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens_text", &self.max_tokens_text)
            .field("max_tokens_document", &self.max_tokens_document)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("min_text_chars", &self.min_text_chars)
            .field("max_text_chars", &self.max_text_chars)
            .field("summary_text_chars", &self.summary_text_chars)
            .field("comment_sections", &self.comment_sections)
            .field("extra_boilerplate", &self.extra_boilerplate)
            .field("compress_threshold_bytes", &self.compress_threshold_bytes)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("direct_warn_bytes", &self.direct_warn_bytes)
            .field("port", &self.port)
            .field("upload_dir", &self.upload_dir)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens_text: 2000,
            max_tokens_document: 4000,
            temperature: 0.3,
            request_timeout_secs: 120,
            min_text_chars: 100,
            max_text_chars: 100_000,
            summary_text_chars: 50_000,
            comment_sections: false,
            extra_boilerplate: Vec::new(),
            compress_threshold_bytes: 5 * 1024 * 1024,
            max_upload_bytes: 10 * 1024 * 1024,
            direct_warn_bytes: 5 * 1024 * 1024,
            port: 3001,
            upload_dir: None,
        }
    }
}

impl Config {
    /// Build a config from file values, falling back to defaults per field.
    pub fn from_config_file(file: &ConfigFile) -> Self {
        let defaults = Config::default();
        let anthropic = file.anthropic.clone().unwrap_or_default();
        let extraction = file.extraction.clone().unwrap_or_default();
        let server = file.server.clone().unwrap_or_default();

        Self {
            api_key: anthropic.api_key,
            model: anthropic.model.unwrap_or(defaults.model),
            base_url: anthropic.base_url.unwrap_or(defaults.base_url),
            max_tokens_text: anthropic.max_tokens.unwrap_or(defaults.max_tokens_text),
            max_tokens_document: anthropic
                .max_tokens_document
                .unwrap_or(defaults.max_tokens_document),
            temperature: anthropic.temperature.unwrap_or(defaults.temperature),
            request_timeout_secs: anthropic
                .timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            min_text_chars: extraction
                .min_text_chars
                .unwrap_or(defaults.min_text_chars),
            max_text_chars: extraction
                .max_text_chars
                .unwrap_or(defaults.max_text_chars),
            summary_text_chars: extraction
                .summary_text_chars
                .unwrap_or(defaults.summary_text_chars),
            comment_sections: extraction
                .comment_sections
                .unwrap_or(defaults.comment_sections),
            extra_boilerplate: extraction.boilerplate_patterns.unwrap_or_default(),
            compress_threshold_bytes: extraction
                .compress_threshold_mb
                .map(|mb| mb as usize * 1024 * 1024)
                .unwrap_or(defaults.compress_threshold_bytes),
            max_upload_bytes: server
                .max_upload_mb
                .map(|mb| mb as usize * 1024 * 1024)
                .unwrap_or(defaults.max_upload_bytes),
            direct_warn_bytes: defaults.direct_warn_bytes,
            port: server.port.unwrap_or(defaults.port),
            upload_dir: server.upload_dir.map(PathBuf::from),
        }
    }

    /// Apply environment variable overrides (`ANTHROPIC_API_KEY`,
    /// `ANTHROPIC_BASE_URL`, `EVALSUM_MODEL`, `PORT`).
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup("ANTHROPIC_API_KEY").filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup("ANTHROPIC_BASE_URL").filter(|u| !u.is_empty()) {
            self.base_url = url;
        }
        if let Some(model) = lookup("EVALSUM_MODEL").filter(|m| !m.is_empty()) {
            self.model = model;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_file::{AnthropicConfig, ExtractionConfig, ServerConfig};

    #[test]
    fn pdf_signature_detection() {
        let doc = SourceDocument::new(b"%PDF-1.7\n...".to_vec(), "a.pdf", None);
        assert!(doc.has_pdf_signature());
        assert_eq!(doc.size_bytes(), 12);

        let empty = SourceDocument::new(Vec::new(), "a.pdf", None);
        assert!(!empty.has_pdf_signature());

        let png = SourceDocument::new(b"\x89PNG\r\n".to_vec(), "a.png", None);
        assert!(!png.has_pdf_signature());

        let short = SourceDocument::new(b"%PD".to_vec(), "a.pdf", None);
        assert!(!short.has_pdf_signature());
    }

    #[test]
    fn upload_type_check() {
        assert!(is_pdf_upload("evals.PDF", None));
        assert!(is_pdf_upload("download", Some("application/pdf")));
        assert!(!is_pdf_upload("notes.txt", Some("text/plain")));
        assert!(!is_pdf_upload("pdf", None));
    }

    #[test]
    fn compression_ratio() {
        let info = CompressionInfo {
            original_bytes: 8_000_000,
            compressed_bytes: 6_000_000,
        };
        assert!((info.ratio() - 25.0).abs() < 1e-9);
        let grew = CompressionInfo {
            original_bytes: 100,
            compressed_bytes: 120,
        };
        assert_eq!(grew.ratio(), 0.0);
    }

    #[test]
    fn debug_omits_bytes() {
        let doc = SourceDocument::new(vec![b'x'; 4096], "big.pdf", None);
        let rendered = format!("{:?}", doc);
        assert!(rendered.contains("4096"));
        assert!(!rendered.contains("120, 120"));
    }

    #[test]
    fn finished_event_is_always_100() {
        assert_eq!(ProgressEvent::Finished { success: false }.percent(), 100);
        assert_eq!(ProgressEvent::Cleaning { percent: 95 }.percent(), 95);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = Config {
            api_key: Some("sk-ant-REDACTED".into()),
            ..Config::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn config_file_values_override_defaults() {
        let file = ConfigFile {
            anthropic: Some(AnthropicConfig {
                model: Some("claude-test".into()),
                timeout_secs: Some(60),
                ..Default::default()
            }),
            extraction: Some(ExtractionConfig {
                max_text_chars: Some(50_000),
                summary_text_chars: Some(20_000),
                comment_sections: Some(true),
                ..Default::default()
            }),
            server: Some(ServerConfig {
                port: Some(8080),
                max_upload_mb: Some(20),
                ..Default::default()
            }),
        };
        let config = Config::from_config_file(&file);
        assert_eq!(config.model, "claude-test");
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.max_text_chars, 50_000);
        assert_eq!(config.summary_text_chars, 20_000);
        assert!(config.comment_sections);
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        // Untouched fields keep their defaults
        assert_eq!(config.min_text_chars, 100);
        assert_eq!(Config::default().summary_text_chars, 50_000);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn env_overrides_win() {
        let config = Config::default().with_overrides_from(|name| match name {
            "ANTHROPIC_API_KEY" => Some("sk-ant-from-env-0123456789".into()),
            "PORT" => Some("9000".into()),
            "EVALSUM_MODEL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(
            config.api_key.as_deref(),
            Some("sk-ant-from-env-0123456789")
        );
        assert_eq!(config.port, 9000);
        // Empty values are ignored
        assert_eq!(config.model, DEFAULT_MODEL);
    }
}
