//! Mock summarizer for testing.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{Summarizer, SummarizerFuture, SummaryInput, UpstreamError};

/// One recorded call to a [`MockSummarizer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Text { text: String, api_key: String },
    Document { filename: String, size_bytes: usize, api_key: String },
    Probe { api_key: String },
}

/// A hand-rolled mock implementing [`Summarizer`] for tests.
///
/// Counts summarize and probe calls separately, records their arguments and
/// can simulate latency.
pub struct MockSummarizer {
    response: Result<String, UpstreamError>,
    probe_response: Result<(), UpstreamError>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
    summarize_count: AtomicUsize,
    probe_count: AtomicUsize,
}

impl MockSummarizer {
    /// A mock whose summaries always succeed with `summary`.
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            response: Ok(summary.into()),
            probe_response: Ok(()),
            delay: None,
            calls: Mutex::new(Vec::new()),
            summarize_count: AtomicUsize::new(0),
            probe_count: AtomicUsize::new(0),
        }
    }

    /// A mock whose summaries and probes both fail with `err`.
    pub fn failing(err: UpstreamError) -> Self {
        Self {
            response: Err(err.clone()),
            probe_response: Err(err),
            ..Self::new("")
        }
    }

    pub fn with_probe_response(mut self, response: Result<(), UpstreamError>) -> Self {
        self.probe_response = response;
        self
    }

    /// Set simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `summarize()` has been called.
    pub fn call_count(&self) -> usize {
        self.summarize_count.load(Ordering::SeqCst)
    }

    /// How many times `probe()` has been called.
    pub fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: RecordedCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

impl Summarizer for MockSummarizer {
    fn summarize<'a>(
        &'a self,
        input: SummaryInput<'a>,
        api_key: &'a str,
    ) -> SummarizerFuture<'a, String> {
        self.summarize_count.fetch_add(1, Ordering::SeqCst);
        self.record(match input {
            SummaryInput::Text(text) => RecordedCall::Text {
                text: text.to_string(),
                api_key: api_key.to_string(),
            },
            SummaryInput::Document { bytes, filename } => RecordedCall::Document {
                filename: filename.to_string(),
                size_bytes: bytes.len(),
                api_key: api_key.to_string(),
            },
        });
        let response = self.response.clone();
        let delay = self.delay;
        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            response
        })
    }

    fn probe<'a>(&'a self, api_key: &'a str) -> SummarizerFuture<'a, ()> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        self.record(RecordedCall::Probe {
            api_key: api_key.to_string(),
        });
        let response = self.probe_response.clone();
        let delay = self.delay;
        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_text_calls() {
        let mock = MockSummarizer::new("## SUMMARY");
        let out = mock
            .summarize(SummaryInput::Text("great class"), "sk-ant-key")
            .await
            .unwrap();
        assert_eq!(out, "## SUMMARY");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.probe_count(), 0);
        assert_eq!(
            mock.calls(),
            vec![RecordedCall::Text {
                text: "great class".into(),
                api_key: "sk-ant-key".into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_applied() {
        let mock = MockSummarizer::new("ok").with_delay(Duration::from_secs(30));
        let start = tokio::time::Instant::now();
        mock.probe("k").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn failing_mock_fails_both_calls() {
        let mock = MockSummarizer::failing(UpstreamError::Unauthorized);
        assert!(mock.probe("k").await.is_err());
        assert!(
            mock.summarize(SummaryInput::Text("x"), "k")
                .await
                .is_err()
        );
    }
}
