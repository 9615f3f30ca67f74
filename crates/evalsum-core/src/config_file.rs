use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub anthropic: Option<AnthropicConfig>,
    pub extraction: Option<ExtractionConfig>,
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnthropicConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub max_tokens_document: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub min_text_chars: Option<usize>,
    pub max_text_chars: Option<usize>,
    pub summary_text_chars: Option<usize>,
    pub comment_sections: Option<bool>,
    pub compress_threshold_mb: Option<u32>,
    /// Extra boilerplate line patterns, added to the built-in ones.
    pub boilerplate_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub max_upload_mb: Option<u32>,
    pub upload_dir: Option<String>,
}

/// Platform config directory path: `<config_dir>/evalsum/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("evalsum").join("config.toml"))
}

/// Load config by cascading CWD `.evalsum.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".evalsum.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Overlay value if set, otherwise the base value.
fn pick<S, T>(
    overlay: &Option<S>,
    base: &Option<S>,
    field: impl Fn(&S) -> Option<T>,
) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (ba, oa) = (&base.anthropic, &overlay.anthropic);
    let (be, oe) = (&base.extraction, &overlay.extraction);
    let (bs, os) = (&base.server, &overlay.server);

    ConfigFile {
        anthropic: Some(AnthropicConfig {
            api_key: pick(oa, ba, |a| a.api_key.clone()),
            model: pick(oa, ba, |a| a.model.clone()),
            base_url: pick(oa, ba, |a| a.base_url.clone()),
            max_tokens: pick(oa, ba, |a| a.max_tokens),
            max_tokens_document: pick(oa, ba, |a| a.max_tokens_document),
            temperature: pick(oa, ba, |a| a.temperature),
            timeout_secs: pick(oa, ba, |a| a.timeout_secs),
        }),
        extraction: Some(ExtractionConfig {
            min_text_chars: pick(oe, be, |e| e.min_text_chars),
            max_text_chars: pick(oe, be, |e| e.max_text_chars),
            summary_text_chars: pick(oe, be, |e| e.summary_text_chars),
            comment_sections: pick(oe, be, |e| e.comment_sections),
            compress_threshold_mb: pick(oe, be, |e| e.compress_threshold_mb),
            boilerplate_patterns: pick(oe, be, |e| e.boilerplate_patterns.clone()),
        }),
        server: Some(ServerConfig {
            port: pick(os, bs, |s| s.port),
            max_upload_mb: pick(os, bs, |s| s.max_upload_mb),
            upload_dir: pick(os, bs, |s| s.upload_dir.clone()),
        }),
    }
}
