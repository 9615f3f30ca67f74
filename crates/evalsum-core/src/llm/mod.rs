//! Summarization client abstraction.

pub mod anthropic;
pub mod mock;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

pub use anthropic::AnthropicClient;

/// Instructions sent ahead of every evaluation.
pub const SUMMARY_PROMPT: &str = "\
You are a kind and constructive assistant helping an instructor make sense of \
their course evaluations. Work through the student comments and:

1. Leave out comments that are hurtful or purely negative without anything actionable.
2. Group the constructive feedback into themes and count how often each theme comes up.
3. Summarize the actionable suggestions, most frequent first.
4. Quote the positive and encouraging comments verbatim.

Answer in exactly this format:

## CONSTRUCTIVE FEEDBACK SUMMARY

**Most Frequent Suggestions:**
• [Theme] (mentioned X times): [summary of the suggestions]

**Additional Suggestions:**
• [less frequent but useful feedback]

## POSITIVE COMMENTS

**Encouraging Feedback:**
\"[exact student quote]\"

**Additional Positive Notes:**
• [positive feedback that was not quotable]

## OVERALL SENTIMENT
[short description of the overall tone and any patterns]

Be thorough but concise, and keep the focus on insights that help the \
instructor improve while keeping their confidence.";

/// What to summarize.
#[derive(Debug, Clone, Copy)]
pub enum SummaryInput<'a> {
    /// Cleaned evaluation text.
    Text(&'a str),
    /// A whole PDF handed to the model as a document block.
    Document { bytes: &'a [u8], filename: &'a str },
}

/// Failure talking to the summarization service.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("Invalid API key. Please check your Anthropic API key.")]
    Unauthorized,
    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited { retry_after: Option<Duration> },
    #[error("PDF file is too large. Please try with a smaller file (under 5MB recommended).")]
    Oversized,
    #[error("Failed to process comments with AI: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Upstream("request timed out".to_string())
        } else {
            UpstreamError::Upstream(e.to_string())
        }
    }
}

/// Boxed future returned by [`Summarizer`] methods.
pub type SummarizerFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, UpstreamError>> + Send + 'a>>;

/// A service that turns evaluation text or documents into a summary.
pub trait Summarizer: Send + Sync {
    /// Produce a summary for `input` using the caller's credential.
    fn summarize<'a>(
        &'a self,
        input: SummaryInput<'a>,
        api_key: &'a str,
    ) -> SummarizerFuture<'a, String>;

    /// Make the smallest possible authenticated call to check the credential.
    fn probe<'a>(&'a self, api_key: &'a str) -> SummarizerFuture<'a, ()>;
}
