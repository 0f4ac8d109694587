//! Tool-call accumulation for streamed deltas

use std::collections::BTreeMap;

use crate::types::{ToolCall, ToolCallDelta};

#[derive(Debug, Default, Clone)]
struct PartialToolCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Collects tool-call fragments into complete [`ToolCall`]s, keyed by `index`.
///
/// `id` and `name` are taken from the first fragment that carries a non-empty
/// value; `arguments` fragments are concatenated in arrival order. No JSON
/// parsing happens here: the arguments stay the raw string the model produced.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<usize, PartialToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta: &ToolCallDelta) {
        let entry = self.calls.entry(delta.index).or_default();

        if entry.id.is_none() {
            entry.id = delta.id.clone().filter(|id| !id.is_empty());
        }
        if let Some(function) = &delta.function {
            if entry.name.is_none() {
                entry.name = function.name.clone().filter(|n| !n.is_empty());
            }
            if let Some(fragment) = &function.arguments {
                entry.arguments.push_str(fragment);
            }
        }
    }

    pub fn extend<'a>(&mut self, deltas: impl IntoIterator<Item = &'a ToolCallDelta>) {
        for delta in deltas {
            self.push(delta);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Raw argument text of the lowest-index call seen so far.
    pub fn first_arguments(&self) -> Option<&str> {
        self.calls.values().next().map(|c| c.arguments.as_str())
    }

    /// Complete calls in index order. Calls that never received an id get
    /// `tool_call_{index}` so the tool response can still be matched.
    pub fn finalize(self) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .map(|(index, partial)| {
                ToolCall::function(
                    partial.id.unwrap_or_else(|| format!("tool_call_{}", index)),
                    partial.name.unwrap_or_default(),
                    partial.arguments,
                )
            })
            .collect()
    }
}
