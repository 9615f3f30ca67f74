//! Text cleaning for extracted evaluation text.
//!
//! Steps, in order:
//! 1. Line endings and ligatures
//! 2. Invisible/control characters, per-line whitespace
//! 3. Structural noise: table borders, dot leaders, document IDs, `Page N of M`,
//!    page markers and page numbers, boilerplate lines, running letterhead
//! 4. Optional comment-section filter
//! 5. Blank-line collapse and length cap
//!
//! Cleaning is idempotent: text that already ends in a cut of exactly
//! `max_chars` characters followed by [`TRUNCATION_MARKER`] is passed through
//! instead of being cleaned and cut again.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CleanerConfig;
use crate::text_processing::{
    collapse_line_whitespace, expand_ligatures, normalize_line_endings, strip_invisible,
};

/// Appended to text that was cut at the length cap.
pub const TRUNCATION_MARKER: &str = "\n\n[Text truncated due to length]";

static TABLE_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+=_\-]{3,}").unwrap());
static DOT_LEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{4,}").unwrap());
static DOC_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9][0-9-]{9,}[0-9]\b").unwrap());
static PAGE_OF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpage\s+\d+\s+of\s+\d+\b").unwrap());
static PAGE_MARKER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^-{2,}\s*page\s+\d+\s*-{2,}$").unwrap());
static PAGE_NUMBER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:page\s+)?\d{1,4}$").unwrap());
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static NUMERIC_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[(\[]?[-+]?\d+(?:[.,]\d+)?%?[)\]]?[,;]?$").unwrap());

static DEFAULT_BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^report (?:generated|printed|run|created) (?:on|by|at)\b",
        r"(?i)\ball rights reserved\b",
        r"(?i)^(?:confidential|for internal use only)\b",
        r"(?i)^(?:©|\(c\)|copyright\b)",
        r"(?i)^powered by\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static DEFAULT_HEADERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^what (?:aspects|did you (?:like|enjoy)|worked well|was (?:most|least) helpful)",
        r"(?i)^what (?:changes|improvements|suggestions)",
        r"(?i)^(?:please )?(?:provide|share) (?:any )?(?:additional )?comments",
        r"(?i)^(?:additional |general |student |open[- ]ended |other )?comments?\s*:?$",
        r"(?i)^(?:strengths|weaknesses|suggestions(?: for improvement)?)\s*:?$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static DEFAULT_RATINGS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bstrongly (?:agree|disagree)\b",
        r"(?i)^(?:mean|median|mode|std\.?\s*dev\.?|standard deviation|response rate)\b",
        r"(?i)^n\s*=",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Cleans raw extracted text into something worth sending to a summarizer.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    config: CleanerConfig,
    boilerplate: Vec<Regex>,
    headers: Vec<Regex>,
    ratings: Vec<Regex>,
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl TextCleaner {
    /// Create a cleaner with default configuration.
    pub fn new() -> Self {
        Self::with_config(CleanerConfig::default())
    }

    /// Create a cleaner with a custom configuration.
    pub fn with_config(config: CleanerConfig) -> Self {
        Self {
            boilerplate: config.boilerplate_patterns.resolve(&DEFAULT_BOILERPLATE),
            headers: config.header_patterns.resolve(&DEFAULT_HEADERS),
            ratings: config.rating_patterns.resolve(&DEFAULT_RATINGS),
            config,
        }
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Run every cleaning step, including the length cap.
    pub fn clean(&self, text: &str) -> String {
        let (body, had_marker) = split_marker(text);
        if had_marker && self.is_settled_cut(body) {
            return text.to_string();
        }
        let body = self.clean_body(body);

        match self.config.max_chars {
            Some(max) if body.chars().count() > max => cut(&body, max),
            _ if had_marker && !body.is_empty() => format!("{}{}", body, TRUNCATION_MARKER),
            _ => body,
        }
    }

    /// Whether `body` is a cut this cleaner could have produced: exactly
    /// `max_chars` chars, output-safe, and every line before the partial
    /// last one already clean.
    fn is_settled_cut(&self, body: &str) -> bool {
        let Some(max) = self.config.max_chars else {
            return false;
        };
        if max == 0
            || body.chars().count() != max
            || body.starts_with(char::is_whitespace)
            || body.ends_with('\n')
            || body.contains("  ")
            || body.contains("\n\n\n")
            || body.contains('|')
            || strip_invisible(body) != body
        {
            return false;
        }
        let full_lines = &body[..body.rfind('\n').unwrap_or(0)];
        self.clean_body(full_lines) == full_lines.trim_end()
    }

    /// Steps 1–5 without the length cap.
    fn clean_body(&self, text: &str) -> String {
        let text = self.normalize(text);
        let text = if self.config.comment_sections {
            self.filter_comment_sections(&text)
        } else {
            text
        };
        collapse_blank_runs(&text)
    }

    fn normalize(&self, text: &str) -> String {
        let text = normalize_line_endings(text);
        let text = expand_ligatures(&text);
        let text = strip_invisible(&text);
        let text = collapse_line_whitespace(&text);

        let text = text.replace('|', " ");
        let text = TABLE_RULE.replace_all(&text, " ");
        let text = DOT_LEADER.replace_all(&text, " ");
        let text = DOC_ID.replace_all(&text, " ");
        let text = remove_page_footers(&text);
        let text = collapse_line_whitespace(&text);

        let text = text
            .split('\n')
            .filter(|line| {
                !PAGE_MARKER_LINE.is_match(line)
                    && !PAGE_NUMBER_LINE.is_match(line)
                    && !self.is_boilerplate(line)
            })
            .collect::<Vec<_>>()
            .join("\n");

        self.remove_repeated_lines(&text)
    }

    fn is_boilerplate(&self, line: &str) -> bool {
        self.boilerplate.iter().any(|re| re.is_match(line))
    }

    /// Drop every non-blank line that occurs at least `repeated_line_threshold` times.
    fn remove_repeated_lines(&self, text: &str) -> String {
        let threshold = self.config.repeated_line_threshold;
        if threshold == 0 {
            return text.to_string();
        }
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for line in text.split('\n').filter(|l| !l.is_empty()) {
            *counts.entry(line).or_insert(0) += 1;
        }
        text.split('\n')
            .filter(|line| line.is_empty() || counts.get(line).copied().unwrap_or(0) < threshold)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn is_header(&self, line: &str) -> bool {
        self.headers.iter().any(|re| re.is_match(line))
    }

    fn is_rating_row(&self, line: &str) -> bool {
        if self.ratings.iter().any(|re| re.is_match(line)) {
            return true;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let numeric = tokens.iter().filter(|t| NUMERIC_TOKEN.is_match(t)).count();
        numeric >= 3 && numeric * 2 >= tokens.len()
    }

    /// Keep section headers and the prose lines that follow them; rating
    /// rows end a section. Falls back to the input when no prose survives.
    fn filter_comment_sections(&self, text: &str) -> String {
        let mut kept: Vec<&str> = Vec::new();
        let mut active = false;
        let mut prose_lines = 0usize;

        for line in text.split('\n') {
            if line.is_empty() {
                if active && kept.last().is_some_and(|l| !l.is_empty()) {
                    kept.push("");
                }
                continue;
            }
            if self.is_header(line) {
                active = true;
                kept.push(line);
            } else if self.is_rating_row(line) {
                active = false;
            } else if active && is_prose(line) {
                kept.push(line);
                prose_lines += 1;
            }
        }

        if prose_lines == 0 {
            tracing::debug!("comment filter kept no prose, using unfiltered text");
            return text.to_string();
        }
        kept.join("\n")
    }
}

/// Letters, at least five words and not shouted.
fn is_prose(line: &str) -> bool {
    line.chars().any(|c| c.is_alphabetic())
        && line.split_whitespace().count() >= 5
        && line.chars().any(|c| c.is_lowercase())
}

/// Removing a footer can close the gap around another one
/// (`Page 1 Page 2 of 3 of 4`), so repeat until none are left.
fn remove_page_footers(text: &str) -> String {
    let mut text = text.to_string();
    while PAGE_OF.is_match(&text) {
        text = PAGE_OF.replace_all(&text, " ").into_owned();
    }
    text
}

fn collapse_blank_runs(text: &str) -> String {
    BLANK_RUNS.replace_all(text, "\n\n").trim().to_string()
}

/// Split off an exact trailing [`TRUNCATION_MARKER`].
fn split_marker(text: &str) -> (&str, bool) {
    match text.strip_suffix(TRUNCATION_MARKER) {
        Some(rest) => (rest, true),
        None => (text, false),
    }
}

/// Keep exactly `max` chars of cleaned `body` and append the marker.
fn cut(body: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let mut kept = take_chars(body, max).to_string();
    // A cut ending in a newline would run into the marker's blank line.
    if kept.ends_with('\n') {
        kept.pop();
        kept.push(' ');
    }
    kept.push_str(TRUNCATION_MARKER);
    kept
}

/// The first `n` chars of `text`.
fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cap `text` at `max_chars` characters, appending [`TRUNCATION_MARKER`]
/// when anything was cut. No other cleaning is applied.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    format!("{}{}", take_chars(text, max_chars), TRUNCATION_MARKER)
}
