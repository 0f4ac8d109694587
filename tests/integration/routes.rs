//! HTTP surface: status mapping, rate limiting and key sources

use crate::integration::mock_server::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chat_relay::config::RelayConfig;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

fn simple_request(model: &str) -> Value {
    json!({"messages": [{"role": "user", "content": "hi"}], "model": model})
}

fn keyless_config(fixture: &MockServerFixture) -> RelayConfig {
    RelayConfig::default()
        .with_openrouter_base_url(format!("{}/api/v1", fixture.base_url))
        .with_lmstudio_endpoint(format!("{}/v1", fixture.base_url))
}

#[tokio::test]
async fn health_reports_version() {
    let fixture = MockServerFixture::new().await;
    let response = fixture
        .app()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn second_request_in_window_is_rejected() {
    let fixture = MockServerFixture::new().await;
    let app = fixture.app_with(fixture.config().with_rate_limit(1, Duration::from_secs(60)));
    // the limiter runs before the body is parsed, so an invalid body still counts
    let (first, first_headers, _) = post_chat(app.clone(), json!({})).await;
    assert_eq!(first, StatusCode::BAD_REQUEST);
    assert!(first_headers.get("x-ratelimit-limit").is_none());

    let (status, headers, body) = post_chat(app, json!({})).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(headers["x-ratelimit-limit"], "1");
    assert_eq!(headers["x-ratelimit-remaining"], "0");
    assert!(headers.contains_key("x-ratelimit-reset"));
    let retry_after: u64 = headers["retry-after"].to_str().unwrap().parse().unwrap();
    assert!(retry_after >= 1 && retry_after <= 60);
    let err: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"], "Too many requests");
}

#[tokio::test]
async fn limits_are_tracked_per_forwarded_ip() {
    let fixture = MockServerFixture::new().await;
    let app = fixture.app_with(fixture.config().with_rate_limit(1, Duration::from_secs(60)));

    let (a, _, _) = post_chat_with_headers(app.clone(), json!({}), &[("x-forwarded-for", "10.0.0.1")]).await;
    let (b, _, _) = post_chat_with_headers(app.clone(), json!({}), &[("x-forwarded-for", "10.0.0.2, 10.0.0.9")]).await;
    let (a_again, _, _) = post_chat_with_headers(app, json!({}), &[("x-forwarded-for", "10.0.0.1")]).await;

    assert_eq!(a, StatusCode::BAD_REQUEST);
    assert_eq!(b, StatusCode::BAD_REQUEST);
    assert_eq!(a_again, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn missing_messages_is_bad_request() {
    let fixture = MockServerFixture::new().await;
    let (status, _, body) = post_chat(fixture.app(), json!({"model": "openai/gpt-4o"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"], "Messages array is required");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let fixture = MockServerFixture::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = fixture.app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn remote_model_without_key_is_unauthorized() {
    let fixture = MockServerFixture::new().await;
    let app = fixture.app_with(keyless_config(&fixture));

    let (status, _, body) = post_chat(app, simple_request("openai/gpt-4o")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let err: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"], "OpenRouter API key is not configured");
    assert!(err["suggestion"].as_str().unwrap().contains("X-OpenRouter-Key"));
}

#[tokio::test]
async fn header_key_is_used_when_server_has_none() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_completion_json(&final_response("hello"), 1).await;
    let app = fixture.app_with(keyless_config(&fixture));

    let (status, _, _) = post_chat_with_headers(
        app,
        simple_request("openai/gpt-4o"),
        &[("x-openrouter-key", TEST_KEY)],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    mock.assert_async().await;
}

#[tokio::test]
async fn local_model_does_not_need_a_key() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", LMSTUDIO_PATH)
            .match_body(mockito::Matcher::PartialJsonString(r#"{"model":"qwen2.5-7b"}"#.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(final_response("local answer").to_string())
            .create_async()
            .await
    };
    let app = fixture.app_with(keyless_config(&fixture));

    let (status, _, body) = post_chat(app, simple_request("local/qwen2.5-7b")).await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["choices"][0]["message"]["content"], "local answer");
    mock.assert_async().await;
}

#[tokio::test]
async fn local_connection_refused_is_service_unavailable() {
    let fixture = MockServerFixture::new().await;
    let app = fixture.app_with(fixture.config().with_lmstudio_endpoint("http://127.0.0.1:1/v1"));

    let (status, _, body) = post_chat(app, simple_request("local/llama-3")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let err: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"], "LM Studio is not running");
    assert!(err["suggestion"].as_str().unwrap().contains("http://127.0.0.1:1/v1"));
}

#[tokio::test]
async fn local_error_status_is_preserved() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response(LMSTUDIO_PATH, 404, r#"{"error":"Model not loaded"}"#)
        .await;

    let (status, _, body) = post_chat(fixture.app(), simple_request("local/missing")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let err: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"], "Model not loaded");
}
