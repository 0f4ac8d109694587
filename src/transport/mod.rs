//! 传输层：基于 reqwest 的上游 HTTP 客户端（OpenRouter 与 LM Studio）。
//!
//! Upstream HTTP transport.

mod http;

pub use http::{build_http_client, error_from_response, TransportError, UpstreamClient};
