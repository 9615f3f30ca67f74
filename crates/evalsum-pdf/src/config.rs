use evalsum_core::Config;
use regex::Regex;
use thiserror::Error;

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CleanerConfigError {
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub const DEFAULT_MAX_CHARS: usize = 100_000;
pub const DEFAULT_REPEATED_LINE_THRESHOLD: usize = 3;

/// Configuration for the [`TextCleaner`](crate::TextCleaner).
///
/// Pattern lists are line-level regexes; `Default` means the built-in set.
/// Use [`CleanerConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// Character cap; `None` disables truncation.
    pub(crate) max_chars: Option<usize>,
    /// Drop non-blank lines seen at least this many times (0 disables).
    pub(crate) repeated_line_threshold: usize,
    /// Keep only free-text comment sections.
    pub(crate) comment_sections: bool,
    /// Whole lines to drop (letterhead, copyright, report footers).
    pub(crate) boilerplate_patterns: ListOverride<Regex>,
    /// Lines that open a free-text comment section.
    pub(crate) header_patterns: ListOverride<Regex>,
    /// Lines that belong to a rating table and close a comment section.
    pub(crate) rating_patterns: ListOverride<Regex>,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            max_chars: Some(DEFAULT_MAX_CHARS),
            repeated_line_threshold: DEFAULT_REPEATED_LINE_THRESHOLD,
            comment_sections: false,
            boilerplate_patterns: ListOverride::Default,
            header_patterns: ListOverride::Default,
            rating_patterns: ListOverride::Default,
        }
    }
}

impl CleanerConfig {
    pub fn max_chars(&self) -> Option<usize> {
        self.max_chars
    }

    pub fn comment_sections(&self) -> bool {
        self.comment_sections
    }
}

/// Helper for building `ListOverride<Regex>` from string patterns.
#[derive(Debug, Clone, Default)]
enum ListOverrideBuilder {
    #[default]
    Default,
    Replace(Vec<String>),
    Extend(Vec<String>),
}

impl ListOverrideBuilder {
    fn add(&mut self, pattern: String) {
        match self {
            ListOverrideBuilder::Extend(v) | ListOverrideBuilder::Replace(v) => v.push(pattern),
            ListOverrideBuilder::Default => *self = ListOverrideBuilder::Extend(vec![pattern]),
        }
    }

    fn compile(self) -> Result<ListOverride<Regex>, CleanerConfigError> {
        fn compile_all(patterns: Vec<String>) -> Result<Vec<Regex>, CleanerConfigError> {
            patterns
                .into_iter()
                .map(|p| {
                    Regex::new(&p).map_err(|source| CleanerConfigError::Pattern { pattern: p, source })
                })
                .collect()
        }
        Ok(match self {
            ListOverrideBuilder::Default => ListOverride::Default,
            ListOverrideBuilder::Replace(patterns) => ListOverride::Replace(compile_all(patterns)?),
            ListOverrideBuilder::Extend(patterns) => ListOverride::Extend(compile_all(patterns)?),
        })
    }
}

/// Builder for [`CleanerConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct CleanerConfigBuilder {
    max_chars: Option<Option<usize>>,
    repeated_line_threshold: Option<usize>,
    comment_sections: Option<bool>,
    boilerplate_patterns: ListOverrideBuilder,
    header_patterns: ListOverrideBuilder,
    rating_patterns: ListOverrideBuilder,
}

impl CleanerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from the shared runtime [`Config`].
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new()
            .max_chars(config.max_text_chars)
            .comment_sections(config.comment_sections);
        for pattern in &config.extra_boilerplate {
            builder = builder.add_boilerplate_pattern(pattern.clone());
        }
        builder
    }

    // ── Scalars ──

    pub fn max_chars(mut self, n: usize) -> Self {
        self.max_chars = Some(Some(n));
        self
    }

    pub fn no_truncation(mut self) -> Self {
        self.max_chars = Some(None);
        self
    }

    pub fn repeated_line_threshold(mut self, n: usize) -> Self {
        self.repeated_line_threshold = Some(n);
        self
    }

    pub fn comment_sections(mut self, enabled: bool) -> Self {
        self.comment_sections = Some(enabled);
        self
    }

    // ── Boilerplate ──

    pub fn set_boilerplate_patterns(mut self, patterns: Vec<String>) -> Self {
        self.boilerplate_patterns = ListOverrideBuilder::Replace(patterns);
        self
    }

    pub fn add_boilerplate_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.boilerplate_patterns.add(pattern.into());
        self
    }

    // ── Comment sections ──

    pub fn set_header_patterns(mut self, patterns: Vec<String>) -> Self {
        self.header_patterns = ListOverrideBuilder::Replace(patterns);
        self
    }

    pub fn add_header_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.header_patterns.add(pattern.into());
        self
    }

    pub fn set_rating_patterns(mut self, patterns: Vec<String>) -> Self {
        self.rating_patterns = ListOverrideBuilder::Replace(patterns);
        self
    }

    pub fn add_rating_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.rating_patterns.add(pattern.into());
        self
    }

    /// Compile all string patterns into regexes and produce a [`CleanerConfig`].
    pub fn build(self) -> Result<CleanerConfig, CleanerConfigError> {
        Ok(CleanerConfig {
            max_chars: self.max_chars.unwrap_or(Some(DEFAULT_MAX_CHARS)),
            repeated_line_threshold: self
                .repeated_line_threshold
                .unwrap_or(DEFAULT_REPEATED_LINE_THRESHOLD),
            comment_sections: self.comment_sections.unwrap_or(false),
            boilerplate_patterns: self.boilerplate_patterns.compile()?,
            header_patterns: self.header_patterns.compile()?,
            rating_patterns: self.rating_patterns.compile()?,
        })
    }
}
