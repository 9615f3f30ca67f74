//! API credential checks.

use crate::llm::{Summarizer, UpstreamError};

pub const KEY_PREFIX: &str = "sk-ant-";
const MIN_KEY_LEN: usize = 21;

/// Cheap format check, run before any network call.
pub fn is_well_formed(key: &str) -> bool {
    key.starts_with(KEY_PREFIX) && key.len() >= MIN_KEY_LEN
}

/// Outcome of a full credential check.
#[derive(Debug)]
pub enum KeyCheck {
    Valid,
    /// Failed the local format check; no request was made.
    Malformed,
    /// The service rejected the key (or the probe failed).
    Rejected(UpstreamError),
}

/// Format check first, then a minimal live call.
pub async fn check_key(summarizer: &dyn Summarizer, key: &str) -> KeyCheck {
    if !is_well_formed(key) {
        tracing::debug!(len = key.len(), "api key failed format check");
        return KeyCheck::Malformed;
    }
    match summarizer.probe(key).await {
        Ok(()) => KeyCheck::Valid,
        Err(e) => {
            tracing::info!(error = %e, "api key probe failed");
            KeyCheck::Rejected(e)
        }
    }
}

/// Shorten a key for display: prefix plus the last four characters.
pub fn redact(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", KEY_PREFIX.trim_end_matches('-'), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockSummarizer;

    #[test]
    fn well_formed_requires_prefix_and_length() {
        assert!(is_well_formed("sk-ant-REDACTED"));
        // exactly 21 chars
        assert!(is_well_formed("sk-ant-01234567890123"));
        // 20 chars is too short
        assert!(!is_well_formed("sk-ant-0123456789012"));
        assert!(!is_well_formed("sk-ant-short"));
        assert!(!is_well_formed("sk-openai-0123456789012345"));
        assert!(!is_well_formed(""));
    }

    #[tokio::test]
    async fn malformed_key_skips_network() {
        let mock = MockSummarizer::new("unused");
        let result = check_key(&mock, "sk-ant-short").await;
        assert!(matches!(result, KeyCheck::Malformed));
        assert_eq!(mock.probe_count(), 0);
    }

    #[tokio::test]
    async fn rejected_key_reports_upstream_error() {
        let mock = MockSummarizer::failing(UpstreamError::Unauthorized);
        let result = check_key(&mock, "sk-ant-REDACTED").await;
        assert!(matches!(
            result,
            KeyCheck::Rejected(UpstreamError::Unauthorized)
        ));
        assert_eq!(mock.probe_count(), 1);
    }

    #[tokio::test]
    async fn valid_key_probes_once() {
        let mock = MockSummarizer::new("unused");
        let result = check_key(&mock, "sk-ant-REDACTED").await;
        assert!(matches!(result, KeyCheck::Valid));
        assert_eq!(mock.probe_count(), 1);
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn redact_hides_middle() {
        assert_eq!(redact("sk-ant-REDACTED"), "sk-ant...mnop");
        assert_eq!(redact("short"), "***");
    }
}
