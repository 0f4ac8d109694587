//! chat-relay: 聊天补全中继服务
//!
//! Usage:
//!   chat-relay [--bind <addr>] [--lmstudio-endpoint <url>] [--rate-limit <n>]
//!
//! Every flag can also be given through the environment; flags win.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use chat_relay::config::RelayConfig;
use chat_relay::server::RelayServer;

#[derive(Parser, Debug)]
#[command(name = "chat-relay")]
#[command(about = "Chat-completion relay for OpenRouter and LM Studio with web-search tool calling")]
#[command(version)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "CHAT_RELAY_BIND")]
    bind: Option<SocketAddr>,

    /// OpenAI-compatible base URL of the local LM Studio server
    #[arg(long, env = "LMSTUDIO_ENDPOINT")]
    lmstudio_endpoint: Option<String>,

    /// OpenRouter base URL
    #[arg(long, env = "OPENROUTER_BASE_URL")]
    openrouter_base_url: Option<String>,

    /// Requests per window allowed for one client
    #[arg(long, env = "CHAT_RELAY_RATE_LIMIT")]
    rate_limit: Option<u32>,

    /// Rate-limit window in seconds
    #[arg(long, env = "CHAT_RELAY_RATE_WINDOW_SECS")]
    rate_window_secs: Option<u64>,

    /// Upstream request timeout in seconds (no timeout when unset)
    #[arg(long, env = "CHAT_RELAY_UPSTREAM_TIMEOUT_SECS")]
    upstream_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = RelayConfig::from_env().context("loading configuration")?;

    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(url) = cli.lmstudio_endpoint {
        config = config.with_lmstudio_endpoint(url);
    }
    if let Some(url) = cli.openrouter_base_url {
        config = config.with_openrouter_base_url(url);
    }
    if cli.rate_limit.is_some() || cli.rate_window_secs.is_some() {
        let limit = cli.rate_limit.unwrap_or(config.rate_limit);
        let window = cli
            .rate_window_secs
            .map(|s| Duration::from_secs(s.max(1)))
            .unwrap_or(config.rate_window);
        config = config.with_rate_limit(limit, window);
    }
    if let Some(secs) = cli.upstream_timeout_secs.filter(|s| *s > 0) {
        config = config.with_upstream_timeout(Some(Duration::from_secs(secs)));
    }
    config.validate().context("invalid configuration")?;

    if config.openrouter_api_key.is_none() {
        tracing::warn!("OPENROUTER_API_KEY is not set; remote models need a key in the request headers");
    }
    tracing::info!(
        lmstudio = %config.lmstudio_endpoint,
        openrouter = %config.openrouter_base_url,
        rate_limit = config.rate_limit,
        "starting chat relay"
    );

    RelayServer::new(config)?.start().await?;
    Ok(())
}
