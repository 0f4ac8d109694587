//! 搜索工具执行器：调用 Tavily / Serper / Exa，规范化、缓存并格式化结果。
//!
//! # Search Tool Executor
//!
//! Runs a `web_search` tool call against one of three providers and returns
//! text that can be sent straight back to the model as a tool response.
//!
//! [`SearchExecutor::execute`] never fails: network errors, non-2xx answers
//! and unknown providers all come back as a `Search failed: ...` string, so
//! the completion loop has nothing to special-case.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`providers`] | Provider strategy table (request builder + response mapper) |
//! | [`format`] | Markdown rendering of normalized results |

pub mod format;
pub mod providers;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use format::format_results;
use providers::{strategy, SearchQuery};

pub use format::{SearchHit, SearchResults};

/// Results beyond this are never shown to the model.
pub const MAX_FORMATTED_RESULTS: usize = 8;
pub const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchProvider {
    Tavily,
    Serper,
    Exa,
}

impl SearchProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchProvider::Tavily => "tavily",
            SearchProvider::Serper => "serper",
            SearchProvider::Exa => "exa",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SearchProvider::Tavily => "Tavily",
            SearchProvider::Serper => "Serper",
            SearchProvider::Exa => "Exa",
        }
    }
}

impl fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchProvider {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tavily" => Ok(SearchProvider::Tavily),
            "serper" => Ok(SearchProvider::Serper),
            "exa" => Ok(SearchProvider::Exa),
            other => Err(SearchError::UnknownProvider(other.to_string())),
        }
    }
}

/// Why a search produced no results. Rendered into the tool response text,
/// never returned to the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("unknown search provider '{0}'")]
    UnknownProvider(String),

    #[error("no API key configured for {}", .0.display_name())]
    MissingKey(SearchProvider),

    #[error("{} request error: {source}", .provider.display_name())]
    Request {
        provider: SearchProvider,
        #[source]
        source: reqwest::Error,
    },

    #[error("{} returned HTTP {status}: {body}", .provider.display_name())]
    Status {
        provider: SearchProvider,
        status: u16,
        /// First 200 characters of the provider's error body.
        body: String,
    },

    #[error("{} returned an unreadable response: {source}", .provider.display_name())]
    Decode {
        provider: SearchProvider,
        #[source]
        source: reqwest::Error,
    },
}

/// Recency filter accepted by all three providers in different spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "d" => Some(TimeRange::Day),
            "week" | "w" => Some(TimeRange::Week),
            "month" | "m" => Some(TimeRange::Month),
            "year" | "y" => Some(TimeRange::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Day => "day",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
        }
    }

    /// Google `tbs=qdr:` letter.
    pub fn serper_code(&self) -> char {
        match self {
            TimeRange::Day => 'd',
            TimeRange::Week => 'w',
            TimeRange::Month => 'm',
            TimeRange::Year => 'y',
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            TimeRange::Day => 1,
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::Year => 365,
        }
    }
}

/// Client-supplied search tuning (`searchSettings` in the chat request).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    /// Tavily only: `basic` or `advanced`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_depth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<String>,
    /// Tavily only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_answer: Option<bool>,
}

impl SearchSettings {
    pub fn effective_max_results(&self) -> usize {
        self.max_results
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .clamp(1, MAX_FORMATTED_RESULTS)
    }

    pub fn effective_search_depth(&self) -> &str {
        match self.search_depth.as_deref() {
            Some("advanced") => "advanced",
            _ => "basic",
        }
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        self.time_range.as_deref().and_then(TimeRange::parse)
    }
}

/// Base URLs of the providers; each is suffixed with `/search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEndpoints {
    pub tavily: String,
    pub serper: String,
    pub exa: String,
}

impl Default for SearchEndpoints {
    fn default() -> Self {
        Self {
            tavily: "https://api.tavily.com".to_string(),
            serper: "https://google.serper.dev".to_string(),
            exa: "https://api.exa.ai".to_string(),
        }
    }
}

impl SearchEndpoints {
    /// Point every provider at the same base URL.
    pub fn uniform(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            tavily: base.clone(),
            serper: base.clone(),
            exa: base,
        }
    }

    pub fn search_url(&self, provider: SearchProvider) -> String {
        let base = match provider {
            SearchProvider::Tavily => &self.tavily,
            SearchProvider::Serper => &self.serper,
            SearchProvider::Exa => &self.exa,
        };
        format!("{}/search", base.trim_end_matches('/'))
    }
}

pub struct SearchExecutor {
    http: reqwest::Client,
    cache: Arc<TtlCache>,
    endpoints: SearchEndpoints,
}

impl SearchExecutor {
    pub fn new(http: reqwest::Client, cache: Arc<TtlCache>) -> Self {
        Self {
            http,
            cache,
            endpoints: SearchEndpoints::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: SearchEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    pub fn cache_key(provider: SearchProvider, query: &str) -> String {
        format!("{}:{}", provider.as_str(), query)
    }

    /// Search and return formatted text, or a `Search failed: ...` message.
    ///
    /// A cached answer is served before the key is looked at.
    pub async fn execute(
        &self,
        query: &str,
        provider: &str,
        api_key: &str,
        settings: &SearchSettings,
    ) -> String {
        let provider = match provider.parse::<SearchProvider>() {
            Ok(p) => p,
            Err(e) => {
                warn!(provider, "search requested with an unknown provider");
                return format!("Search failed: {}", e);
            }
        };

        let key = Self::cache_key(provider, query);
        if let Some(hit) = self.cache.get(&key) {
            debug!(%provider, query, "search cache hit");
            return hit;
        }

        match self.fetch(provider, query, api_key.trim(), settings).await {
            Ok(results) => {
                info!(%provider, query, results = results.hits.len(), "search completed");
                let text = format_results(query, provider, &results);
                self.cache.set(key, text.clone());
                text
            }
            Err(e) => {
                warn!(%provider, query, error = %e, "search failed");
                format!("Search failed: {}", e)
            }
        }
    }

    async fn fetch(
        &self,
        provider: SearchProvider,
        query: &str,
        api_key: &str,
        settings: &SearchSettings,
    ) -> Result<SearchResults, SearchError> {
        if api_key.is_empty() {
            return Err(SearchError::MissingKey(provider));
        }
        let strategy = strategy(provider);
        let params = SearchQuery {
            query,
            api_key,
            max_results: settings.effective_max_results(),
            search_depth: settings.effective_search_depth(),
            time_range: settings.time_range(),
            include_answer: settings.include_answer.unwrap_or(true),
        };

        let url = self.endpoints.search_url(provider);
        let resp = (strategy.build)(&self.http, &url, &params)
            .send()
            .await
            .map_err(|source| SearchError::Request { provider, source })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                provider,
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|source| SearchError::Decode { provider, source })?;
        Ok((strategy.parse)(&body))
    }
}

impl fmt::Debug for SearchExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchExecutor")
            .field("endpoints", &self.endpoints)
            .field("cache", &self.cache)
            .finish()
    }
}
