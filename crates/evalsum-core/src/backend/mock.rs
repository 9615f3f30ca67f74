//! Mock extraction backend for testing.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{BackendError, ExtractionBackend};

/// A configurable mock response for [`MockBackend`].
#[derive(Clone, Debug)]
pub enum MockOutput {
    /// Return this text.
    Text(String),
    /// Fail with a parse error.
    Error(String),
    /// Panic inside `extract`.
    Panic(String),
}

/// A hand-rolled mock implementing [`ExtractionBackend`] for tests.
///
/// Returns a fixed output, or a sequence of outputs (one per call, repeating
/// the last once exhausted), and counts calls.
pub struct MockBackend {
    name: &'static str,
    outputs: Mutex<Vec<MockOutput>>,
    fallback: MockOutput,
    call_count: AtomicUsize,
}

impl MockBackend {
    /// Create a mock that always returns `output`.
    pub fn new(name: &'static str, output: MockOutput) -> Self {
        Self {
            name,
            outputs: Mutex::new(Vec::new()),
            fallback: output,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Shorthand for a mock that always succeeds with `text`.
    pub fn text(name: &'static str, text: impl Into<String>) -> Self {
        Self::new(name, MockOutput::Text(text.into()))
    }

    /// Shorthand for a mock that always fails.
    pub fn failing(name: &'static str, msg: impl Into<String>) -> Self {
        Self::new(name, MockOutput::Error(msg.into()))
    }

    /// Create a mock that returns outputs in order, repeating the last one.
    pub fn with_sequence(name: &'static str, mut outputs: Vec<MockOutput>) -> Self {
        assert!(!outputs.is_empty(), "sequence must have at least one output");
        outputs.reverse();
        let fallback = outputs[0].clone();
        Self {
            name,
            outputs: Mutex::new(outputs),
            fallback,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `extract()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn next_output(&self) -> MockOutput {
        let mut seq = self.outputs.lock().unwrap_or_else(|e| e.into_inner());
        seq.pop().unwrap_or_else(|| self.fallback.clone())
    }
}

impl ExtractionBackend for MockBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn extract(&self, _bytes: &[u8]) -> Result<String, BackendError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.next_output() {
            MockOutput::Text(text) => Ok(text),
            MockOutput::Error(msg) => Err(BackendError::Parse(msg)),
            MockOutput::Panic(msg) => panic!("{}", msg),
        }
    }
}
