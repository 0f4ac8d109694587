//! 模型能力表：声明哪些模型支持工具调用和推理模式。
//!
//! Static model capability table.
//!
//! Capabilities are matched by model-id prefix, longest prefix wins. Models
//! that match nothing are assumed to support neither tools nor reasoning.

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Capability flags for a family of model identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// Model-id prefix, e.g. `"openai/gpt-4o"`.
    pub prefix: String,
    pub tool_calling: bool,
    pub reasoning: bool,
}

impl ModelCapabilities {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            tool_calling: false,
            reasoning: false,
        }
    }

    pub fn with_tools(mut self) -> Self {
        self.tool_calling = true;
        self
    }

    pub fn with_reasoning(mut self) -> Self {
        self.reasoning = true;
        self
    }
}

// (prefix, tool_calling, reasoning)
const BUILTIN: &[(&str, bool, bool)] = &[
    ("openai/gpt-4", true, false),
    ("openai/gpt-4o", true, false),
    ("openai/gpt-4.1", true, false),
    ("openai/gpt-5", true, true),
    ("openai/o1", true, true),
    ("openai/o3", true, true),
    ("openai/o4", true, true),
    ("anthropic/claude-3", true, false),
    ("anthropic/claude-3.7-sonnet", true, true),
    ("anthropic/claude-sonnet-4", true, true),
    ("anthropic/claude-opus-4", true, true),
    ("google/gemini-2.0", true, false),
    ("google/gemini-2.5", true, true),
    ("mistralai/mistral-large", true, false),
    ("mistralai/mistral-medium", true, false),
    ("meta-llama/llama-3.1", true, false),
    ("meta-llama/llama-3.3", true, false),
    ("meta-llama/llama-4", true, false),
    ("qwen/qwen-2.5", true, false),
    ("qwen/qwen3", true, true),
    ("deepseek/deepseek-chat", true, false),
    ("deepseek/deepseek-r1", false, true),
    ("x-ai/grok", true, false),
    ("x-ai/grok-3-mini", true, true),
];

static DEFAULT_TABLE: Lazy<Arc<CapabilityTable>> = Lazy::new(|| {
    Arc::new(CapabilityTable::new(
        BUILTIN
            .iter()
            .map(|(prefix, tools, reasoning)| ModelCapabilities {
                prefix: (*prefix).to_string(),
                tool_calling: *tools,
                reasoning: *reasoning,
            })
            .collect(),
    ))
});

/// Prefix-matched capability lookup injected into the request builder.
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    entries: Vec<ModelCapabilities>,
}

impl CapabilityTable {
    pub fn new(entries: Vec<ModelCapabilities>) -> Self {
        Self { entries }
    }

    /// The built-in table for OpenRouter model ids.
    pub fn builtin() -> &'static CapabilityTable {
        &**DEFAULT_TABLE
    }

    /// Handle to the built-in table; every caller shares one allocation.
    pub fn shared() -> Arc<CapabilityTable> {
        Arc::clone(&DEFAULT_TABLE)
    }

    pub fn lookup(&self, model: &str) -> Option<&ModelCapabilities> {
        let model = model.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|e| model.starts_with(&e.prefix))
            .max_by_key(|e| e.prefix.len())
    }

    pub fn supports_tools(&self, model: &str) -> bool {
        self.lookup(model).map(|c| c.tool_calling).unwrap_or(false)
    }

    pub fn supports_reasoning(&self, model: &str) -> bool {
        self.lookup(model).map(|c| c.reasoning).unwrap_or(false)
    }
}
