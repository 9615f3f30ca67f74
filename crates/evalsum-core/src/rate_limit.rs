//! Upstream HTTP status handling for the summarization API.
//!
//! The client never retries on its own; a 429 is surfaced to the caller with
//! whatever `Retry-After` hint the server supplied.

use std::time::Duration;

use crate::llm::UpstreamError;

/// Map a non-success response status to an [`UpstreamError`].
///
/// Returns `Ok(())` for 2xx responses. The body is not consumed, so callers
/// can still read the error payload for the generic case.
pub fn check_response_status(resp: &reqwest::Response) -> Result<(), UpstreamError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    match status.as_u16() {
        401 | 403 => Err(UpstreamError::Unauthorized),
        413 => Err(UpstreamError::Oversized),
        429 => {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            Err(UpstreamError::RateLimited { retry_after })
        }
        code => Err(UpstreamError::Upstream(format!("HTTP {}", code))),
    }
}

/// Parse a Retry-After header value (seconds or HTTP-date).
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    if let Ok(secs) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    // HTTP-date: use a conservative fixed wait rather than parsing the date
    if value.contains(',') || value.contains("GMT") {
        return Some(Duration::from_secs(5));
    }
    None
}
