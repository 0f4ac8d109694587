//! Search executor against mocked providers

use crate::integration::mock_server::*;
use chat_relay::cache::{ManualClock, TtlCache};
use chat_relay::config::DEFAULT_SEARCH_CACHE_TTL;
use chat_relay::search::{SearchEndpoints, SearchExecutor, SearchSettings};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn executor(fixture: &MockServerFixture, cache: TtlCache) -> SearchExecutor {
    SearchExecutor::new(reqwest::Client::new(), Arc::new(cache))
        .with_endpoints(SearchEndpoints::uniform(fixture.base_url.clone()))
}

#[tokio::test]
async fn cached_results_skip_provider_until_ttl() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_tavily(
            &json!({"results": [{"title": "Docs", "url": "https://docs.rs", "content": "crate docs"}]}),
            2,
        )
        .await;
    let clock = Arc::new(ManualClock::new());
    let search = executor(
        &fixture,
        TtlCache::with_clock(DEFAULT_SEARCH_CACHE_TTL, clock.clone()),
    );
    let settings = SearchSettings::default();

    let first = search.execute("docs", "tavily", "tvly-test", &settings).await;
    let second = search.execute("docs", "tavily", "tvly-test", &settings).await;
    assert_eq!(first, second);
    assert!(first.contains("1. **Docs**"));

    clock.advance(DEFAULT_SEARCH_CACHE_TTL + Duration::from_secs(1));
    let third = search.execute("docs", "tavily", "tvly-test", &settings).await;
    assert_eq!(first, third);

    mock.assert_async().await;
}

#[tokio::test]
async fn serper_results_are_formatted() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", SEARCH_PATH)
            .match_header("x-api-key", "serper-test")
            .match_body(Matcher::PartialJsonString(r#"{"q":"tokio","num":3,"tbs":"qdr:w"}"#.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "answerBox": {"answer": "An async runtime for Rust"},
                    "organic": [
                        {"title": "Tokio", "link": "https://tokio.rs", "snippet": "Build reliable network applications"},
                        {"title": "tokio - crates.io", "link": "https://crates.io/crates/tokio", "snippet": "An event-driven platform"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await
    };
    let search = executor(&fixture, TtlCache::new(DEFAULT_SEARCH_CACHE_TTL));
    let settings = SearchSettings {
        max_results: Some(3),
        time_range: Some("week".into()),
        ..Default::default()
    };

    let text = search.execute("tokio", "serper", "serper-test", &settings).await;

    assert!(text.starts_with("## Search results for \"tokio\""));
    assert!(text.contains("**Summary:** An async runtime for Rust"));
    assert!(text.contains("1. **Tokio**\n   Build reliable network applications\n   Source: https://tokio.rs"));
    assert!(text.contains("2. **tokio - crates.io**"));
    assert!(text.ends_with("_Results provided by Serper_"));
    mock.assert_async().await;
}

#[tokio::test]
async fn exa_results_prefer_summary() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", SEARCH_PATH)
            .match_header("x-api-key", "exa-test")
            .match_body(Matcher::PartialJsonString(r#"{"query":"axum","numResults":5,"type":"auto"}"#.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "results": [
                        {"title": "axum", "url": "https://docs.rs/axum", "summary": "Ergonomic web framework", "text": "long body"},
                        {"title": "Announcing axum", "url": "https://tokio.rs/blog", "text": "Release notes"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await
    };
    let search = executor(&fixture, TtlCache::new(DEFAULT_SEARCH_CACHE_TTL));

    let text = search
        .execute("axum", "exa", "exa-test", &SearchSettings::default())
        .await;

    assert!(!text.contains("**Summary:**"));
    assert!(text.contains("1. **axum**\n   Ergonomic web framework\n"));
    assert!(text.contains("2. **Announcing axum**\n   Release notes\n"));
    assert!(text.ends_with("_Results provided by Exa_"));
    mock.assert_async().await;
}

#[tokio::test]
async fn provider_failure_is_not_cached() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", SEARCH_PATH)
            .with_status(500)
            .with_body("internal")
            .expect(2)
            .create_async()
            .await
    };
    let search = executor(&fixture, TtlCache::new(DEFAULT_SEARCH_CACHE_TTL));
    let settings = SearchSettings::default();

    let first = search.execute("q", "tavily", "tvly-test", &settings).await;
    let second = search.execute("q", "tavily", "tvly-test", &settings).await;

    assert!(first.starts_with("Search failed: Tavily returned HTTP 500"));
    assert_eq!(first, second);
    assert!(search.cache().is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn unknown_provider_makes_no_request() {
    let fixture = MockServerFixture::new().await;
    let search = executor(&fixture, TtlCache::new(DEFAULT_SEARCH_CACHE_TTL));

    let text = search
        .execute("q", "bing", "key", &SearchSettings::default())
        .await;

    assert!(text.starts_with("Search failed:"));
    assert!(text.contains("bing"));
}
