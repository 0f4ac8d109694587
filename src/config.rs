//! 配置模块：从环境变量加载中继服务配置。
//!
//! Relay configuration.
//!
//! Every knob has a default and can be overridden through the environment, so
//! a bare `chat-relay` binary talks to OpenRouter and a local LM Studio out of
//! the box. Endpoints are validated once at load time.

use crate::{Error, ErrorContext, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_LMSTUDIO_ENDPOINT: &str = "http://localhost:1234/v1";
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
pub const DEFAULT_APP_TITLE: &str = "Chat Relay";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";

/// Model identifiers with this prefix are served by the local backend.
pub const LOCAL_MODEL_PREFIX: &str = "local/";
/// Upper bound on model round-trips per request when tools are involved.
pub const MAX_TOOL_ITERATIONS: usize = 3;
/// Completion length never goes below this, whatever the client asks for.
pub const MAX_TOKENS_FLOOR: u32 = 16_000;
/// Search results are re-fetched after this long.
pub const DEFAULT_SEARCH_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Server-side OpenRouter key; clients may supply their own when absent.
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub lmstudio_endpoint: String,
    /// Sent as `HTTP-Referer` for OpenRouter attribution.
    pub app_url: String,
    /// Sent as `X-Title` for OpenRouter attribution.
    pub app_title: String,
    pub bind_addr: SocketAddr,
    pub rate_limit: u32,
    pub rate_window: Duration,
    /// No timeout unless explicitly configured.
    pub upstream_timeout: Option<Duration>,
    pub search_cache_ttl: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            openrouter_base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
            lmstudio_endpoint: DEFAULT_LMSTUDIO_ENDPOINT.to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8787))),
            rate_limit: 30,
            rate_window: Duration::from_secs(60),
            upstream_timeout: None,
            search_cache_ttl: DEFAULT_SEARCH_CACHE_TTL,
        }
    }
}

impl RelayConfig {
    /// Load from process environment on top of defaults.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        cfg.openrouter_api_key = env_string("OPENROUTER_API_KEY");
        if let Some(url) = env_string("OPENROUTER_BASE_URL") {
            cfg.openrouter_base_url = url;
        }
        if let Some(url) = env_string("LMSTUDIO_ENDPOINT") {
            cfg.lmstudio_endpoint = url;
        }
        if let Some(url) = env_string("NEXT_PUBLIC_APP_URL").or_else(|| env_string("APP_URL")) {
            cfg.app_url = url;
        }
        if let Some(title) = env_string("APP_TITLE") {
            cfg.app_title = title;
        }
        if let Some(addr) = env_string("CHAT_RELAY_BIND") {
            cfg.bind_addr = addr.parse().map_err(|_| {
                Error::configuration_with_context(
                    format!("invalid bind address: {}", addr),
                    ErrorContext::new().with_field_path("CHAT_RELAY_BIND"),
                )
            })?;
        }
        if let Some(limit) = env_parse::<u32>("CHAT_RELAY_RATE_LIMIT") {
            cfg.rate_limit = limit.max(1);
        }
        if let Some(secs) = env_parse::<u64>("CHAT_RELAY_RATE_WINDOW_SECS") {
            cfg.rate_window = Duration::from_secs(secs.max(1));
        }
        cfg.upstream_timeout = env_parse::<u64>("CHAT_RELAY_UPSTREAM_TIMEOUT_SECS")
            .filter(|s| *s > 0)
            .map(Duration::from_secs);
        if let Some(secs) = env_parse::<u64>("CHAT_RELAY_SEARCH_CACHE_TTL_SECS") {
            cfg.search_cache_ttl = Duration::from_secs(secs);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Check that every endpoint is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("OPENROUTER_BASE_URL", &self.openrouter_base_url),
            ("LMSTUDIO_ENDPOINT", &self.lmstudio_endpoint),
            ("APP_URL", &self.app_url),
        ] {
            let parsed = url::Url::parse(value).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid URL '{}'", value),
                    ErrorContext::new()
                        .with_field_path(field)
                        .with_details(e.to_string()),
                )
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::configuration_with_context(
                    format!("unsupported scheme '{}'", parsed.scheme()),
                    ErrorContext::new().with_field_path(field),
                ));
            }
        }
        Ok(())
    }

    pub fn with_openrouter_api_key(mut self, key: impl Into<String>) -> Self {
        self.openrouter_api_key = Some(key.into());
        self
    }

    pub fn with_openrouter_base_url(mut self, url: impl Into<String>) -> Self {
        self.openrouter_base_url = url.into();
        self
    }

    pub fn with_lmstudio_endpoint(mut self, url: impl Into<String>) -> Self {
        self.lmstudio_endpoint = url.into();
        self
    }

    pub fn with_rate_limit(mut self, limit: u32, window: Duration) -> Self {
        self.rate_limit = limit.max(1);
        self.rate_window = window;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.upstream_timeout = timeout;
        self
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|s| s.parse::<T>().ok())
}
