//! Anthropic Messages API client.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{SUMMARY_PROMPT, Summarizer, SummarizerFuture, SummaryInput, UpstreamError};
use crate::Config;
use crate::rate_limit::check_response_status;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROBE_MAX_TOKENS: u32 = 10;

/// Summarizer backed by `POST {base_url}/v1/messages`.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens_text: u32,
    max_tokens_document: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    pub fn from_config(config: &Config) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens_text: config.max_tokens_text,
            max_tokens_document: config.max_tokens_document,
            temperature: config.temperature,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn request_body(&self, input: SummaryInput<'_>) -> Value {
        match input {
            SummaryInput::Text(text) => json!({
                "model": self.model,
                "max_tokens": self.max_tokens_text,
                "temperature": self.temperature,
                "messages": [{
                    "role": "user",
                    "content": format!(
                        "{}\n\nHere are the course evaluation comments to analyze:\n{}",
                        SUMMARY_PROMPT, text
                    ),
                }],
            }),
            SummaryInput::Document { bytes, .. } => json!({
                "model": self.model,
                "max_tokens": self.max_tokens_document,
                "temperature": self.temperature,
                "messages": [{
                    "role": "user",
                    "content": [
                        {
                            "type": "document",
                            "source": {
                                "type": "base64",
                                "media_type": "application/pdf",
                                "data": STANDARD.encode(bytes),
                            },
                        },
                        {
                            "type": "text",
                            "text": format!(
                                "{}\n\nThe course evaluations are in the attached PDF.",
                                SUMMARY_PROMPT
                            ),
                        },
                    ],
                }],
            }),
        }
    }

    async fn post(&self, body: &Value, api_key: &str) -> Result<MessagesResponse, UpstreamError> {
        let resp = self
            .client
            .post(self.messages_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await?;

        if let Err(err) = check_response_status(&resp) {
            if let UpstreamError::Upstream(_) = err {
                let status = resp.status().as_u16();
                let detail = resp
                    .json::<Value>()
                    .await
                    .ok()
                    .and_then(|v| v["error"]["message"].as_str().map(String::from));
                return Err(UpstreamError::Upstream(match detail {
                    Some(msg) => format!("HTTP {}: {}", status, msg),
                    None => format!("HTTP {}", status),
                }));
            }
            return Err(err);
        }

        resp.json::<MessagesResponse>()
            .await
            .map_err(|e| UpstreamError::Upstream(format!("malformed response: {}", e)))
    }
}

/// Join the text blocks of a response, failing if there are none.
fn response_text(resp: MessagesResponse) -> Result<String, UpstreamError> {
    let text: Vec<String> = resp
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .collect();
    if text.is_empty() {
        return Err(UpstreamError::Upstream(
            "malformed response: no text content".to_string(),
        ));
    }
    Ok(text.join("\n"))
}

impl Summarizer for AnthropicClient {
    fn summarize<'a>(
        &'a self,
        input: SummaryInput<'a>,
        api_key: &'a str,
    ) -> SummarizerFuture<'a, String> {
        Box::pin(async move {
            let body = self.request_body(input);
            match input {
                SummaryInput::Text(text) => {
                    tracing::info!(
                        chars = text.chars().count(),
                        model = %self.model,
                        "summarizing text"
                    );
                }
                SummaryInput::Document { bytes, filename } => {
                    tracing::info!(
                        filename,
                        size_bytes = bytes.len(),
                        model = %self.model,
                        "summarizing document"
                    );
                }
            }
            let resp = self.post(&body, api_key).await.inspect_err(|e| {
                tracing::warn!(error = %e, "summarization request failed");
            })?;
            response_text(resp)
        })
    }

    fn probe<'a>(&'a self, api_key: &'a str) -> SummarizerFuture<'a, ()> {
        Box::pin(async move {
            let body = json!({
                "model": self.model,
                "max_tokens": PROBE_MAX_TOKENS,
                "messages": [{ "role": "user", "content": "Hello" }],
            });
            let resp = self.post(&body, api_key).await?;
            response_text(resp).map(|_| ())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AnthropicClient {
        AnthropicClient::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn text_body_uses_text_budget() {
        let body = client().request_body(SummaryInput::Text("Loved the labs."));
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["model"], crate::DEFAULT_MODEL);
        let content = body["messages"][0]["content"].as_str().unwrap();
        assert!(content.starts_with(SUMMARY_PROMPT));
        assert!(content.ends_with("Loved the labs."));
    }

    #[test]
    fn document_body_is_base64_pdf_block() {
        let body = client().request_body(SummaryInput::Document {
            bytes: b"%PDF-1.4",
            filename: "evals.pdf",
        });
        assert_eq!(body["max_tokens"], 4000);
        let block = &body["messages"][0]["content"][0];
        assert_eq!(block["type"], "document");
        assert_eq!(block["source"]["media_type"], "application/pdf");
        assert_eq!(block["source"]["data"], STANDARD.encode(b"%PDF-1.4"));
        assert_eq!(body["messages"][0]["content"][1]["type"], "text");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = Config {
            base_url: "http://localhost:9999/".into(),
            ..Config::default()
        };
        let client = AnthropicClient::from_config(&config).unwrap();
        assert_eq!(client.messages_url(), "http://localhost:9999/v1/messages");
    }

    #[test]
    fn empty_content_is_malformed() {
        let resp = MessagesResponse { content: vec![] };
        assert!(matches!(
            response_text(resp),
            Err(UpstreamError::Upstream(_))
        ));
    }

    #[test]
    fn text_blocks_are_joined() {
        let resp = MessagesResponse {
            content: vec![
                ContentBlock {
                    kind: "text".into(),
                    text: Some("one".into()),
                },
                ContentBlock {
                    kind: "tool_use".into(),
                    text: None,
                },
                ContentBlock {
                    kind: "text".into(),
                    text: Some("two".into()),
                },
            ],
        };
        assert_eq!(response_text(resp).unwrap(), "one\ntwo");
    }
}
