//! 协议层：构造发往模型服务的请求体，并维护模型能力表。
//!
//! # Protocol Layer
//!
//! Turns an inbound conversation into the OpenAI-compatible body sent to
//! OpenRouter or LM Studio. Optional parts of the body (tool manifest,
//! `tool_choice`, reasoning effort) are decided against a static
//! [`CapabilityTable`] instead of conditionals scattered through the loops.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capabilities`] | Prefix-matched tool-calling / reasoning support flags |
//! | [`request`] | [`CompletionRequest`] body and [`RequestBuilder`] |
//!
//! ```rust
//! use chat_relay::protocol::{BuildOptions, CapabilityTable, RequestBuilder};
//! use chat_relay::types::{ChatMessage, SamplingParams};
//!
//! let body = RequestBuilder::new(CapabilityTable::builtin()).build(
//!     "openai/gpt-4o",
//!     vec![ChatMessage::user("2+2?")],
//!     &SamplingParams { max_tokens: Some(100), ..Default::default() },
//!     BuildOptions::default(),
//! );
//! assert_eq!(body.max_tokens, 16_000);
//! ```

pub mod capabilities;
pub mod request;

pub use capabilities::{CapabilityTable, ModelCapabilities};
pub use request::{effective_max_tokens, BuildOptions, CompletionRequest, ReasoningConfig, RequestBuilder};
