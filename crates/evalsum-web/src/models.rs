use serde::{Deserialize, Serialize};

// Request bodies keep every field optional so a missing field produces the
// handler's own validation message instead of a deserialization error.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestKeyRequest {
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTextRequest {
    pub text: Option<String>,
    pub api_key: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct TestKeyResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}
