//! Non-streaming chat round-trips through the HTTP surface

use crate::integration::mock_server::*;
use axum::http::StatusCode;
use mockito::Matcher;
use serde_json::{json, Value};

fn search_request(stream: bool) -> Value {
    json!({
        "messages": [{"role": "user", "content": "What's the weather today?"}],
        "model": "openai/gpt-4o",
        "stream": stream,
        "enableAutoSearch": true,
        "searchProvider": "tavily",
        "searchApiKey": "tvly-test"
    })
}

#[tokio::test]
async fn happy_path_returns_raw_provider_json() {
    let fixture = MockServerFixture::new().await;
    let upstream = final_response("4");
    let mock = fixture
        .mock_completion_json_matching(
            Matcher::PartialJsonString(r#"{"model":"openai/gpt-4o","max_tokens":16000,"stream":false}"#.into()),
            &upstream,
            1,
        )
        .await;

    let (status, _, body) = post_chat(
        fixture.app(),
        json!({
            "messages": [{"role": "user", "content": "2+2?"}],
            "model": "openai/gpt-4o",
            "maxTokens": 100
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let returned: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(returned, upstream);
    mock.assert_async().await;
}

#[tokio::test]
async fn search_round_trip_returns_only_final_answer() {
    let fixture = MockServerFixture::new().await;

    let first = fixture
        .mock_completion_json_matching(
            Matcher::PartialJsonString(r#"{"tool_choice":"auto"}"#.into()),
            &tool_call_response("call_1", "web_search", r#"{"query":"weather today"}"#),
            1,
        )
        .await;
    let final_answer = final_response("It is sunny.");
    let second = fixture
        .mock_completion_json_matching(
            Matcher::AllOf(vec![
                Matcher::Regex(r#""role":"tool""#.into()),
                Matcher::Regex(r#""tool_call_id":"call_1""#.into()),
                Matcher::Regex(r#"## Search results for \\"weather today\\""#.into()),
            ]),
            &final_answer,
            1,
        )
        .await;
    let search = fixture
        .mock_tavily(
            &json!({
                "answer": "Sunny, 21C",
                "results": [{"title": "Forecast", "url": "https://weather.example", "content": "Clear skies"}]
            }),
            1,
        )
        .await;

    let (status, _, body) = post_chat(fixture.app(), search_request(false)).await;

    assert_eq!(status, StatusCode::OK);
    let returned: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(returned, final_answer);
    first.assert_async().await;
    second.assert_async().await;
    search.assert_async().await;
}

#[tokio::test]
async fn assistant_turn_is_replayed_with_reasoning_fields() {
    let fixture = MockServerFixture::new().await;

    let mut first_response = tool_call_response("call_r", "web_search", r#"{"query":"weather today"}"#);
    first_response["choices"][0]["message"]["reasoning"] = json!("Need a live forecast.");
    first_response["choices"][0]["message"]["reasoning_details"] =
        json!([{"type": "reasoning.encrypted", "data": "gAAAA-opaque"}]);
    let first = fixture
        .mock_completion_json_matching(
            Matcher::PartialJsonString(r#"{"tool_choice":"auto"}"#.into()),
            &first_response,
            1,
        )
        .await;
    let final_answer = final_response("Sunny.");
    let second = fixture
        .mock_completion_json_matching(
            Matcher::AllOf(vec![
                Matcher::Regex("reasoning_details".into()),
                Matcher::Regex("gAAAA-opaque".into()),
                Matcher::Regex(r#""reasoning":"Need a live forecast.""#.into()),
                Matcher::Regex(r#""role":"tool""#.into()),
            ]),
            &final_answer,
            1,
        )
        .await;
    let _search = fixture
        .mock_tavily(&json!({"results": [{"title": "Forecast", "url": "https://w", "content": "Clear"}]}), 1)
        .await;

    let (status, _, body) = post_chat(fixture.app(), search_request(false)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), final_answer);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn loop_stops_after_three_iterations() {
    let fixture = MockServerFixture::new().await;
    let upstream = fixture
        .mock_completion_json(
            &tool_call_response("call_loop", "web_search", r#"{"query":"again"}"#),
            3,
        )
        .await;
    // same query every time: the cache keeps it to one provider call
    let search = fixture
        .mock_tavily(&json!({"results": [{"title": "T", "url": "https://t", "content": "c"}]}), 1)
        .await;

    let (status, _, body) = post_chat(fixture.app(), search_request(false)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"], "Maximum tool iterations reached");
    upstream.assert_async().await;
    search.assert_async().await;
}

#[tokio::test]
async fn unknown_tool_does_not_abort_loop() {
    let fixture = MockServerFixture::new().await;
    let first = fixture
        .mock_completion_json(&tool_call_response("call_x", "calculator", r#"{"expr":"2+2"}"#), 1)
        .await;
    let final_answer = final_response("4");
    let second = fixture
        .mock_completion_json_matching(
            Matcher::Regex("Unknown tool: calculator".into()),
            &final_answer,
            1,
        )
        .await;

    let (status, _, body) = post_chat(fixture.app(), search_request(false)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), final_answer);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn search_failure_becomes_tool_text() {
    let fixture = MockServerFixture::new().await;
    let _search = fixture
        .mock_error_response(SEARCH_PATH, 401, r#"{"detail":"invalid api key"}"#)
        .await;
    let first = fixture
        .mock_completion_json(&tool_call_response("call_1", "web_search", r#"{"query":"x"}"#), 1)
        .await;
    let final_answer = final_response("I could not search.");
    let second = fixture
        .mock_completion_json_matching(
            Matcher::Regex("Search failed: Tavily returned HTTP 401".into()),
            &final_answer,
            1,
        )
        .await;

    let (status, _, _) = post_chat(fixture.app(), search_request(false)).await;

    assert_eq!(status, StatusCode::OK);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn upstream_error_status_is_preserved() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response(
            OPENROUTER_PATH,
            402,
            r#"{"error":{"message":"Insufficient credits","code":402}}"#,
        )
        .await;

    let (status, _, body) = post_chat(
        fixture.app(),
        json!({"messages": [{"role": "user", "content": "hi"}], "model": "openai/gpt-4o"}),
    )
    .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    let err: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"], "Insufficient credits");
}

#[tokio::test]
async fn upstream_plain_text_error_is_surfaced() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response(OPENROUTER_PATH, 503, "upstream overloaded")
        .await;

    let (status, _, body) = post_chat(
        fixture.app(),
        json!({"messages": [{"role": "user", "content": "hi"}], "model": "openai/gpt-4o"}),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let err: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"], "upstream overloaded");
}
