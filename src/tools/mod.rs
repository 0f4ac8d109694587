//! 工具模块：工具清单、工具执行器接口，以及保持原始顺序的并发执行。
//!
//! # Tools
//!
//! The model only ever sees one tool, `web_search`, but execution goes through
//! the [`ToolRunner`] seam so the loops can be tested with scripted runners.
//!
//! [`ToolSet::execute_all`] runs every call of one model turn concurrently and
//! returns the tool-response messages in the order of the original calls,
//! whatever order they finish in. Nothing in here fails: unknown tools and bad
//! arguments become response text the model can react to.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use tracing::{debug, warn};

use crate::search::{SearchExecutor, SearchSettings};
use crate::types::tool::FunctionDefinition;
use crate::types::{ChatMessage, ToolCall, ToolDefinition};

pub const WEB_SEARCH_TOOL: &str = "web_search";

/// Manifest entry advertised to tool-capable models.
pub fn web_search_tool() -> ToolDefinition {
    ToolDefinition {
        tool_type: "function".to_string(),
        function: FunctionDefinition {
            name: WEB_SEARCH_TOOL.to_string(),
            description: Some(
                "Search the web for current information. Use this when the question needs \
                 recent events, live data, or facts you are unsure about."
                    .to_string(),
            ),
            parameters: Some(json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            })),
        },
    }
}

#[async_trait]
pub trait ToolRunner: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    fn name(&self) -> String {
        self.definition().function.name
    }

    /// Execute the call; the returned text becomes the tool message content.
    async fn run(&self, call: &ToolCall) -> String;
}

/// Runners available for one request.
#[derive(Clone, Default)]
pub struct ToolSet {
    runners: Vec<Arc<dyn ToolRunner>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.runners.push(runner);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.runners.iter().map(|r| r.definition()).collect()
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn ToolRunner>> {
        self.runners.iter().find(|r| r.name() == name)
    }

    /// Run all calls concurrently; responses keep the calls' order.
    pub async fn execute_all(&self, calls: &[ToolCall]) -> Vec<ChatMessage> {
        let futures = calls.iter().map(|call| async move {
            let name = call.function.name.as_str();
            let content = match self.find(name) {
                Some(runner) => {
                    debug!(tool = name, tool_call_id = %call.id, "executing tool call");
                    runner.run(call).await
                }
                None => {
                    warn!(tool = name, tool_call_id = %call.id, "model requested an unknown tool");
                    format!("Unknown tool: {}", name)
                }
            };
            ChatMessage::tool_response(call.id.clone(), name, content)
        });
        join_all(futures).await
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.runners.iter().map(|r| r.name()).collect();
        f.debug_struct("ToolSet").field("runners", &names).finish()
    }
}

/// `web_search` backed by the shared [`SearchExecutor`].
pub struct SearchToolRunner {
    executor: Arc<SearchExecutor>,
    provider: String,
    api_key: String,
    settings: SearchSettings,
}

impl SearchToolRunner {
    pub fn new(
        executor: Arc<SearchExecutor>,
        provider: impl Into<String>,
        api_key: impl Into<String>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            executor,
            provider: provider.into(),
            api_key: api_key.into(),
            settings,
        }
    }
}

#[async_trait]
impl ToolRunner for SearchToolRunner {
    fn definition(&self) -> ToolDefinition {
        web_search_tool()
    }

    fn name(&self) -> String {
        WEB_SEARCH_TOOL.to_string()
    }

    async fn run(&self, call: &ToolCall) -> String {
        let query = call
            .parsed_arguments()
            .and_then(|args| args.get("query").and_then(|q| q.as_str()).map(str::to_string))
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());

        match query {
            Some(query) => {
                self.executor
                    .execute(&query, &self.provider, &self.api_key, &self.settings)
                    .await
            }
            None => {
                warn!(tool_call_id = %call.id, "web_search called without a usable query");
                format!(
                    "Invalid arguments for {}: expected a JSON object with a non-empty \"query\" string, got {}",
                    WEB_SEARCH_TOOL, call.function.arguments
                )
            }
        }
    }
}
