//! Outbound chat-completion request body.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::capabilities::CapabilityTable;
use crate::config::MAX_TOKENS_FLOOR;
use crate::types::{ChatMessage, SamplingParams, ToolDefinition};

/// OpenAI-compatible `/chat/completions` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningConfig {
    pub effort: String,
}

impl CompletionRequest {
    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().map(|t| !t.is_empty()).unwrap_or(false)
    }
}

/// Builds request bodies against a capability table.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    capabilities: &'a CapabilityTable,
}

/// Per-request switches that decide optional parts of the body.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub stream: bool,
    pub reasoning: bool,
    /// Tool manifest to advertise; empty means tool calling is off.
    pub tools: Vec<ToolDefinition>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(capabilities: &'a CapabilityTable) -> Self {
        Self { capabilities }
    }

    pub fn build(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        sampling: &SamplingParams,
        options: BuildOptions,
    ) -> CompletionRequest {
        let attach_tools = !options.tools.is_empty() && self.capabilities.supports_tools(model);
        if !options.tools.is_empty() && !attach_tools {
            debug!(model, "model not known to support tool calling, omitting tools");
        }
        if options.reasoning && !self.capabilities.supports_reasoning(model) {
            debug!(model, "reasoning requested for a model without declared reasoning support");
        }

        let (tools, tool_choice) = if attach_tools {
            (Some(options.tools), Some("auto".to_string()))
        } else {
            (None, None)
        };

        CompletionRequest {
            model: model.to_string(),
            messages,
            temperature: sampling.temperature,
            max_tokens: effective_max_tokens(sampling.max_tokens),
            top_p: sampling.top_p,
            frequency_penalty: sampling.frequency_penalty,
            presence_penalty: sampling.presence_penalty,
            stream: options.stream,
            tools,
            tool_choice,
            reasoning: options.reasoning.then(|| ReasoningConfig {
                effort: "high".to_string(),
            }),
        }
    }
}

/// The larger of what the caller asked for and the floor.
pub fn effective_max_tokens(requested: Option<u32>) -> u32 {
    requested.unwrap_or(0).max(MAX_TOKENS_FLOOR)
}
