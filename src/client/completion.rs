//! Non-streaming completion loop.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::session::CompletionSession;
use crate::transport::TransportError;
use crate::types::{ChatMessage, ToolCall};
use crate::{Error, Result};

/// What one upstream answer asks the loop to do next.
#[derive(Debug)]
enum Turn {
    Final,
    /// `message` is the assistant turn to replay, upstream fields included.
    ToolCalls {
        message: ChatMessage,
        calls: Vec<ToolCall>,
    },
}

fn inspect(response: &Value) -> Turn {
    let choice = &response["choices"][0];
    if choice["finish_reason"].as_str() != Some("tool_calls") {
        return Turn::Final;
    }
    let raw = &choice["message"];
    let calls: Vec<ToolCall> = raw
        .get("tool_calls")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    if calls.is_empty() {
        return Turn::Final;
    }
    let message = match serde_json::from_value::<ChatMessage>(raw.clone()) {
        Ok(mut message) => {
            message.tool_calls = Some(calls.clone());
            message
        }
        Err(e) => {
            debug!(error = %e, "assistant message not replayable as-is, rebuilding");
            let content = raw["content"]
                .as_str()
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            ChatMessage::assistant_tool_calls(content, calls.clone())
        }
    };
    Turn::ToolCalls { message, calls }
}

/// Request, run tools, re-request; at most `session.max_iterations` times.
///
/// Returns the first answer that does not finish with `tool_calls`, exactly as
/// the upstream sent it.
pub async fn run_completion(session: &CompletionSession, mut messages: Vec<ChatMessage>) -> Result<Value> {
    for iteration in 1..=session.max_iterations {
        let body = session.build_request(&messages, false);
        let resp = session.upstream.send_checked(&body).await?;
        let response: Value = resp.json().await.map_err(TransportError::from)?;

        match inspect(&response) {
            Turn::Final => {
                debug!(iteration, "completion finished");
                return Ok(response);
            }
            Turn::ToolCalls { message, calls } => {
                info!(iteration, tool_calls = calls.len(), "model requested tool calls");
                let responses = session.tools.execute_all(&calls).await;
                messages.push(message);
                messages.extend(responses);
            }
        }
    }

    warn!(limit = session.max_iterations, "tool loop did not converge");
    Err(Error::MaxToolIterations {
        limit: session.max_iterations,
    })
}
