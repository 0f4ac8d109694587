//! 类型系统模块：定义对话消息、工具调用和客户端流事件。
//!
//! # Types Module
//!
//! Core data model shared by the completion loops, the request builder and the
//! HTTP surface.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChatMessage`] | Conversation turn (system, user, assistant, tool) |
//! | [`ToolCall`] | Complete function call emitted by the model |
//! | [`ToolCallDelta`] | Streamed fragment of a tool call, merged by index |
//! | [`ChatRequest`] | Inbound `POST /api/chat` body |
//! | [`ClientEvent`] | Frames written to the browser's event stream |

pub mod events;
pub mod message;
pub mod request;
pub mod tool;

pub use events::ClientEvent;
pub use message::{ChatMessage, ContentPart, MessageContent, MessageRole};
pub use request::{ChatRequest, SamplingParams};
pub use tool::{ToolCall, ToolCallDelta, ToolDefinition};
