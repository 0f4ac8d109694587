//! Per-provider request shaping and response mapping.
//!
//! The three search APIs disagree on auth placement, parameter names and
//! response layout, so each gets its own pair of functions instead of a
//! shared abstraction.

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};

use super::format::{SearchHit, SearchResults};
use super::{SearchProvider, TimeRange};

/// Parameters common to all providers, already clamped.
#[derive(Debug, Clone)]
pub struct SearchQuery<'a> {
    pub query: &'a str,
    pub api_key: &'a str,
    pub max_results: usize,
    pub search_depth: &'a str,
    pub time_range: Option<TimeRange>,
    pub include_answer: bool,
}

type BuildFn = fn(&reqwest::Client, &str, &SearchQuery<'_>) -> reqwest::RequestBuilder;
type ParseFn = fn(&Value) -> SearchResults;

pub struct ProviderStrategy {
    pub provider: SearchProvider,
    pub build: BuildFn,
    pub parse: ParseFn,
}

static STRATEGIES: [ProviderStrategy; 3] = [
    ProviderStrategy {
        provider: SearchProvider::Tavily,
        build: tavily_request,
        parse: tavily_results,
    },
    ProviderStrategy {
        provider: SearchProvider::Serper,
        build: serper_request,
        parse: serper_results,
    },
    ProviderStrategy {
        provider: SearchProvider::Exa,
        build: exa_request,
        parse: exa_results,
    },
];

pub fn strategy(provider: SearchProvider) -> &'static ProviderStrategy {
    match provider {
        SearchProvider::Tavily => &STRATEGIES[0],
        SearchProvider::Serper => &STRATEGIES[1],
        SearchProvider::Exa => &STRATEGIES[2],
    }
}

// Tavily: key in the JSON body, answer at top level, results[].content
fn tavily_request(http: &reqwest::Client, url: &str, q: &SearchQuery<'_>) -> reqwest::RequestBuilder {
    let mut body = json!({
        "api_key": q.api_key,
        "query": q.query,
        "search_depth": q.search_depth,
        "max_results": q.max_results,
        "include_answer": q.include_answer,
    });
    if let Some(range) = q.time_range {
        body["time_range"] = json!(range.as_str());
    }
    http.post(url).json(&body)
}

fn tavily_results(body: &Value) -> SearchResults {
    SearchResults {
        answer: str_field(body, "answer"),
        hits: array(body, "results")
            .map(|r| SearchHit {
                title: str_field(r, "title").unwrap_or_default(),
                url: str_field(r, "url").unwrap_or_default(),
                snippet: str_field(r, "content").unwrap_or_default(),
            })
            .collect(),
    }
}

// Serper: X-API-KEY header, Google-style organic[] with link/snippet
fn serper_request(http: &reqwest::Client, url: &str, q: &SearchQuery<'_>) -> reqwest::RequestBuilder {
    let mut body = json!({
        "q": q.query,
        "num": q.max_results,
    });
    if let Some(range) = q.time_range {
        body["tbs"] = json!(format!("qdr:{}", range.serper_code()));
    }
    http.post(url).header("X-API-KEY", q.api_key).json(&body)
}

fn serper_results(body: &Value) -> SearchResults {
    let answer = body
        .get("answerBox")
        .and_then(|b| str_field(b, "answer").or_else(|| str_field(b, "snippet")))
        .or_else(|| body.get("knowledgeGraph").and_then(|k| str_field(k, "description")));
    SearchResults {
        answer,
        hits: array(body, "organic")
            .map(|r| SearchHit {
                title: str_field(r, "title").unwrap_or_default(),
                url: str_field(r, "link").unwrap_or_default(),
                snippet: str_field(r, "snippet").unwrap_or_default(),
            })
            .collect(),
    }
}

// Exa: x-api-key header, numResults, no instant answer
fn exa_request(http: &reqwest::Client, url: &str, q: &SearchQuery<'_>) -> reqwest::RequestBuilder {
    let mut body = json!({
        "query": q.query,
        "numResults": q.max_results,
        "type": "auto",
        "contents": { "text": { "maxCharacters": 1000 }, "summary": true },
    });
    if let Some(range) = q.time_range {
        let since = Utc::now() - ChronoDuration::days(range.days());
        body["startPublishedDate"] = json!(since.to_rfc3339_opts(chrono::SecondsFormat::Millis, true));
    }
    http.post(url).header("x-api-key", q.api_key).json(&body)
}

fn exa_results(body: &Value) -> SearchResults {
    SearchResults {
        answer: None,
        hits: array(body, "results")
            .map(|r| SearchHit {
                title: str_field(r, "title").unwrap_or_default(),
                url: str_field(r, "url").unwrap_or_default(),
                snippet: str_field(r, "summary")
                    .or_else(|| str_field(r, "text"))
                    .or_else(|| {
                        r.get("highlights")
                            .and_then(|h| h.get(0))
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .unwrap_or_default(),
            })
            .collect(),
    }
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn array<'a>(v: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    v.get(key)
        .and_then(Value::as_array)
        .map(|a| a.as_slice())
        .unwrap_or_default()
        .iter()
}
