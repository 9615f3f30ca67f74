//! Drives `AnthropicClient` against a local fake Messages API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use evalsum_core::credential::{KeyCheck, check_key};
use evalsum_core::{AnthropicClient, Config, Summarizer, SummaryInput, UpstreamError};

const GOOD_KEY: &str = "sk-ant-REDACTED";

#[derive(Clone, Default)]
struct Seen {
    bodies: Arc<Mutex<Vec<Value>>>,
    versions: Arc<Mutex<Vec<String>>>,
}

async fn messages(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    seen.bodies.lock().unwrap().push(body);
    if let Some(v) = headers.get("anthropic-version").and_then(|v| v.to_str().ok()) {
        seen.versions.lock().unwrap().push(v.to_string());
    }
    let key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match key {
        GOOD_KEY => Json(json!({
            "id": "msg_1",
            "type": "message",
            "content": [{ "type": "text", "text": "## CONSTRUCTIVE FEEDBACK SUMMARY" }],
        }))
        .into_response(),
        "sk-ant-REDACTED" => {
            (StatusCode::TOO_MANY_REQUESTS, [("retry-after", "7")], "slow down").into_response()
        }
        "sk-ant-REDACTED" => StatusCode::PAYLOAD_TOO_LARGE.into_response(),
        "sk-ant-REDACTED" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "type": "api_error", "message": "overloaded" } })),
        )
            .into_response(),
        "sk-ant-REDACTED" => "not json".into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "type": "authentication_error", "message": "invalid x-api-key" } })),
        )
            .into_response(),
    }
}

async fn spawn_fake_upstream() -> (AnthropicClient, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/v1/messages", post(messages))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = Config {
        base_url: format!("http://{}", addr),
        request_timeout_secs: 5,
        ..Config::default()
    };
    (AnthropicClient::from_config(&config).unwrap(), seen)
}

#[tokio::test]
async fn text_summary_round_trip() {
    let (client, seen) = spawn_fake_upstream().await;
    let summary = client
        .summarize(SummaryInput::Text("The labs were great."), GOOD_KEY)
        .await
        .unwrap();
    assert_eq!(summary, "## CONSTRUCTIVE FEEDBACK SUMMARY");

    let bodies = seen.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["max_tokens"], 2000);
    assert!(
        bodies[0]["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("The labs were great.")
    );
    assert_eq!(seen.versions.lock().unwrap()[0], "2023-06-01");
}

#[tokio::test]
async fn document_mode_sends_pdf_block() {
    let (client, seen) = spawn_fake_upstream().await;
    client
        .summarize(
            SummaryInput::Document {
                bytes: b"%PDF-1.4 fake",
                filename: "evals.pdf",
            },
            GOOD_KEY,
        )
        .await
        .unwrap();
    let bodies = seen.bodies.lock().unwrap();
    assert_eq!(bodies[0]["max_tokens"], 4000);
    assert_eq!(bodies[0]["messages"][0]["content"][0]["type"], "document");
}

#[tokio::test]
async fn status_codes_map_to_error_variants() {
    let (client, _) = spawn_fake_upstream().await;
    let input = SummaryInput::Text("text");

    match client.summarize(input, "sk-ant-wrong-0123456789abc").await {
        Err(UpstreamError::Unauthorized) => {}
        other => panic!("expected Unauthorized, got {:?}", other),
    }
    match client.summarize(input, "sk-ant-REDACTED").await {
        Err(UpstreamError::RateLimited { retry_after }) => {
            assert_eq!(retry_after, Some(Duration::from_secs(7)));
        }
        other => panic!("expected RateLimited, got {:?}", other),
    }
    match client.summarize(input, "sk-ant-REDACTED").await {
        Err(UpstreamError::Oversized) => {}
        other => panic!("expected Oversized, got {:?}", other),
    }
    match client.summarize(input, "sk-ant-REDACTED").await {
        Err(UpstreamError::Upstream(msg)) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("overloaded"));
        }
        other => panic!("expected Upstream, got {:?}", other),
    }
    match client.summarize(input, "sk-ant-REDACTED").await {
        Err(UpstreamError::Upstream(msg)) => assert!(msg.contains("malformed")),
        other => panic!("expected Upstream, got {:?}", other),
    }
}

#[tokio::test]
async fn live_key_check() {
    let (client, seen) = spawn_fake_upstream().await;
    assert!(matches!(check_key(&client, GOOD_KEY).await, KeyCheck::Valid));
    assert!(matches!(
        check_key(&client, "sk-ant-wrong-0123456789abc").await,
        KeyCheck::Rejected(UpstreamError::Unauthorized)
    ));
    // malformed key never reaches the server
    assert!(matches!(
        check_key(&client, "sk-ant-short").await,
        KeyCheck::Malformed
    ));
    let bodies = seen.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["max_tokens"], 10);
}

#[tokio::test]
async fn unreachable_upstream_is_generic_error() {
    let config = Config {
        // port 9 (discard) on localhost is almost never listening
        base_url: "http://127.0.0.1:9".into(),
        request_timeout_secs: 2,
        ..Config::default()
    };
    let client = AnthropicClient::from_config(&config).unwrap();
    let result = client.summarize(SummaryInput::Text("x"), GOOD_KEY).await;
    assert!(matches!(result, Err(UpstreamError::Upstream(_))));
}
