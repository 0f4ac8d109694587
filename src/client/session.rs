//! Per-request state shared by both completion loops.

use std::sync::Arc;

use crate::config::MAX_TOOL_ITERATIONS;
use crate::protocol::{BuildOptions, CapabilityTable, CompletionRequest, RequestBuilder};
use crate::tools::ToolSet;
use crate::transport::UpstreamClient;
use crate::types::{ChatMessage, SamplingParams};

/// Everything a completion loop needs besides the running message list.
#[derive(Clone, Debug)]
pub struct CompletionSession {
    pub upstream: UpstreamClient,
    pub capabilities: Arc<CapabilityTable>,
    /// Model id as sent upstream (local prefix already stripped).
    pub model: String,
    pub sampling: SamplingParams,
    pub reasoning: bool,
    pub tools: ToolSet,
    pub max_iterations: usize,
}

impl CompletionSession {
    pub fn new(upstream: UpstreamClient, model: impl Into<String>) -> Self {
        Self {
            upstream,
            capabilities: CapabilityTable::shared(),
            model: model.into(),
            sampling: SamplingParams::default(),
            reasoning: false,
            tools: ToolSet::new(),
            max_iterations: MAX_TOOL_ITERATIONS,
        }
    }

    pub fn with_capabilities(mut self, capabilities: Arc<CapabilityTable>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_reasoning(mut self, reasoning: bool) -> Self {
        self.reasoning = reasoning;
        self
    }

    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn build_request(&self, messages: &[ChatMessage], stream: bool) -> CompletionRequest {
        RequestBuilder::new(&self.capabilities).build(
            &self.model,
            messages.to_vec(),
            &self.sampling,
            BuildOptions {
                stream,
                reasoning: self.reasoning,
                tools: self.tools.definitions(),
            },
        )
    }
}
