//! Mock HTTP server setup for integration tests

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use chat_relay::config::RelayConfig;
use chat_relay::server::{build_app, AppState};
use chat_relay::search::SearchEndpoints;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;

pub const OPENROUTER_PATH: &str = "/api/v1/chat/completions";
pub const LMSTUDIO_PATH: &str = "/v1/chat/completions";
pub const SEARCH_PATH: &str = "/search";
pub const TEST_KEY: &str = "sk-or-test";

/// Test fixture that manages a mock server standing in for OpenRouter,
/// LM Studio and the search providers at once.
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Config pointing every upstream at the mock server.
    pub fn config(&self) -> RelayConfig {
        RelayConfig::default()
            .with_openrouter_api_key(TEST_KEY)
            .with_openrouter_base_url(format!("{}/api/v1", self.base_url))
            .with_lmstudio_endpoint(format!("{}/v1", self.base_url))
    }

    pub fn app(&self) -> Router {
        self.app_with(self.config())
    }

    pub fn app_with(&self, config: RelayConfig) -> Router {
        let state = AppState::with_search_endpoints(config, SearchEndpoints::uniform(&self.base_url))
            .expect("test config is valid");
        build_app(state)
    }

    /// Non-streaming completion answer, hit `expect` times.
    pub async fn mock_completion_json(&self, body: &Value, expect: usize) -> Mock {
        self.mock_completion_json_matching(Matcher::Any, body, expect).await
    }

    pub async fn mock_completion_json_matching(&self, matcher: Matcher, body: &Value, expect: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", OPENROUTER_PATH)
            .match_header("authorization", format!("Bearer {}", TEST_KEY).as_str())
            .match_body(matcher)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(expect)
            .create_async()
            .await
    }

    /// Streaming completion answer built from `data:` payloads.
    pub async fn mock_completion_sse(&self, path: &str, matcher: Matcher, chunks: &[&str], expect: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .match_body(matcher)
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body(chunks))
            .expect(expect)
            .create_async()
            .await
    }

    pub async fn mock_error_response(&self, path: &str, status: usize, error_body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(error_body)
            .create_async()
            .await
    }

    /// Tavily-shaped search answer.
    pub async fn mock_tavily(&self, body: &Value, expect: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", SEARCH_PATH)
            .match_body(Matcher::PartialJsonString(r#"{"api_key":"tvly-test"}"#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(expect)
            .create_async()
            .await
    }
}

pub fn sse_body(chunks: &[&str]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            if chunk.starts_with("data: ") {
                format!("{}\n\n", chunk)
            } else {
                format!("data: {}\n\n", chunk)
            }
        })
        .collect::<Vec<_>>()
        .join("")
}

/// POST `/api/chat` through the router without binding a socket.
pub async fn post_chat(app: Router, body: Value) -> (StatusCode, HeaderMap, Bytes) {
    post_chat_with_headers(app, body, &[]).await
}

pub async fn post_chat_with_headers(
    app: Router,
    body: Value,
    headers: &[(&str, &str)],
) -> (StatusCode, HeaderMap, Bytes) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, bytes)
}

/// Split an SSE body into its `data:` payloads.
pub fn sse_payloads(body: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(body)
        .split("\n\n")
        .filter_map(|frame| frame.strip_prefix("data: "))
        .map(str::to_string)
        .collect()
}

pub fn tool_call_response(id: &str, name: &str, arguments: &str) -> Value {
    serde_json::json!({
        "id": "gen-tool",
        "object": "chat.completion",
        "model": "openai/gpt-4o",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": id,
                    "type": "function",
                    "function": {"name": name, "arguments": arguments}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
}

pub fn final_response(text: &str) -> Value {
    serde_json::json!({
        "id": "gen-final",
        "object": "chat.completion",
        "model": "openai/gpt-4o",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
    })
}
