//! # chat-relay
//!
//! 多模型聊天补全中继：在 OpenRouter 与本地 LM Studio 之间路由请求，流式转发 SSE，
//! 并在模型请求时执行联网搜索工具调用。
//!
//! Chat-completion relay that sits between a browser chat client and its
//! model backends.
//!
//! ## Overview
//!
//! A single `POST /api/chat` endpoint accepts a conversation and either
//! returns the provider's JSON completion or streams Server-Sent Events back
//! to the browser. Along the way the relay:
//!
//! - routes `local/` models to LM Studio and everything else to OpenRouter
//! - parses the upstream SSE stream while forwarding it, merging fragmented
//!   tool-call deltas by index
//! - runs `web_search` tool calls against Tavily, Serper or Exa and re-enters
//!   the model with the results, at most three times per request
//! - rate-limits clients before any upstream call is made
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chat_relay::config::RelayConfig;
//! use chat_relay::server::RelayServer;
//!
//! #[tokio::main]
//! async fn main() -> chat_relay::Result<()> {
//!     let config = RelayConfig::from_env()?;
//!     RelayServer::new(config)?.start().await
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Messages, tool calls, inbound request, client SSE frames |
//! | [`protocol`] | Outbound request builder and model capability table |
//! | [`pipeline`] | Incremental SSE decoding and tool-call accumulation |
//! | [`cache`] | TTL cache with an injectable clock |
//! | [`search`] | Search tool executor and provider strategy table |
//! | [`tools`] | Tool manifest and ordered concurrent execution |
//! | [`transport`] | Upstream HTTP client |
//! | [`client`] | Non-streaming and streaming completion loops |
//! | [`routing`] | Local / remote backend router |
//! | [`resilience`] | Per-client rate limiter |
//! | [`server`] | axum routes and error responses |
//! | [`config`] | Environment-driven configuration |

pub mod cache;
pub mod client;
pub mod config;
pub mod pipeline;
pub mod protocol;
pub mod resilience;
pub mod routing;
pub mod search;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::CompletionSession;
pub use config::RelayConfig;
pub use routing::{Backend, BackendRouter, RelayResponse};
pub use types::{ChatMessage, ChatRequest, ClientEvent, MessageRole, ToolCall};

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Response body stream handed to the HTTP layer.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send + 'static>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
