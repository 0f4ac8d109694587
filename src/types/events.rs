//! Client-facing Server-Sent-Event frames

use bytes::Bytes;
use serde_json::json;

/// Frames the relay writes to the browser besides the upstream deltas it forwards.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// An upstream `data:` payload forwarded verbatim.
    Forward(String),
    /// Tool execution is about to start.
    Searching { query: String },
    /// Tool execution finished.
    SearchComplete { result_count: usize },
    /// Terminal error frame.
    Error { message: String },
    /// The `[DONE]` terminator.
    Done,
}

impl ClientEvent {
    /// JSON payload carried after the `data: ` prefix.
    pub fn payload(&self) -> String {
        match self {
            ClientEvent::Forward(raw) => raw.clone(),
            ClientEvent::Searching { query } => json!({
                "choices": [{ "delta": { "searching": true, "searchQuery": query } }]
            })
            .to_string(),
            ClientEvent::SearchComplete { result_count } => json!({
                "choices": [{ "delta": { "searchComplete": true, "searchResultCount": result_count } }]
            })
            .to_string(),
            ClientEvent::Error { message } => json!({ "error": message }).to_string(),
            ClientEvent::Done => "[DONE]".to_string(),
        }
    }

    /// Full SSE frame including the blank-line terminator.
    pub fn to_frame(&self) -> Bytes {
        Bytes::from(format!("data: {}\n\n", self.payload()))
    }
}
