//! Parsed view of one streamed chat-completion chunk.

use serde::Deserialize;

use crate::types::ToolCallDelta;

/// The parts of an upstream chunk the streaming loop acts on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamFrame {
    pub content: Option<String>,
    /// `reasoning` (OpenRouter) or `reasoning_content` (DeepSeek style).
    pub reasoning: Option<String>,
    pub tool_calls: Vec<ToolCallDelta>,
    pub finish_reason: Option<String>,
    /// Final accounting chunk.
    pub has_usage: bool,
}

impl StreamFrame {
    /// Whether the client should see this frame when no tool call is in flight.
    pub fn is_forwardable(&self) -> bool {
        let non_empty = |s: &Option<String>| s.as_deref().map(|s| !s.is_empty()).unwrap_or(false);
        self.tool_calls.is_empty()
            && (non_empty(&self.content) || non_empty(&self.reasoning) || self.has_usage)
    }
}

#[derive(Deserialize)]
struct RawChunk {
    #[serde(default)]
    choices: Vec<RawChoice>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawChoice {
    #[serde(default)]
    delta: Option<RawDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct RawDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallDelta>>,
}

/// Attempt to parse a `data:` payload, ignoring it on failure.
///
/// Truncated or otherwise malformed JSON is expected when an upstream frame is
/// cut mid-read; such payloads yield `None` and are dropped without error.
pub fn try_parse_frame(payload: &str) -> Option<StreamFrame> {
    let chunk: RawChunk = serde_json::from_str(payload).ok()?;
    let mut frame = StreamFrame {
        has_usage: chunk.usage.map(|u| !u.is_null()).unwrap_or(false),
        ..Default::default()
    };

    if let Some(choice) = chunk.choices.into_iter().next() {
        frame.finish_reason = choice.finish_reason;
        if let Some(delta) = choice.delta {
            frame.content = delta.content;
            frame.reasoning = delta.reasoning.or(delta.reasoning_content);
            frame.tool_calls = delta.tool_calls.unwrap_or_default();
        }
    }
    Some(frame)
}
