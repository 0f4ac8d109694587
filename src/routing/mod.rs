//! 后端路由：在本地 LM Studio 与远端 OpenRouter 之间分发聊天请求。
//!
//! # Backend Router
//!
//! Model ids starting with `local/` go to LM Studio with the prefix stripped;
//! everything else goes to OpenRouter and needs an API key from the server
//! configuration or the request headers.
//!
//! Local requests bypass the tool loop: streamed answers are piped through
//! byte for byte and JSON answers are re-emitted as JSON. Connection refused
//! is reported separately from other local failures so the client can tell
//! the user to start LM Studio.

use std::sync::Arc;

use futures::TryStreamExt;
use serde_json::Value;
use tracing::{debug, info};

use crate::client::{run_completion, streaming, CompletionSession};
use crate::config::{RelayConfig, LOCAL_MODEL_PREFIX};
use crate::protocol::CapabilityTable;
use crate::search::SearchExecutor;
use crate::tools::{SearchToolRunner, ToolSet};
use crate::transport::{error_from_response, TransportError, UpstreamClient};
use crate::types::ChatRequest;
use crate::{ByteStream, Error, ErrorContext, Result};

/// Provider used when the client enables search without naming one.
pub const DEFAULT_SEARCH_PROVIDER: &str = "tavily";

/// Where a request goes.
#[derive(Clone, PartialEq, Eq)]
pub enum Backend {
    Local { endpoint: String, model: String },
    Remote { api_key: String, model: String },
}

impl Backend {
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Local { .. } => "local",
            Backend::Remote { .. } => "remote",
        }
    }

    /// Model id as forwarded upstream.
    pub fn model(&self) -> &str {
        match self {
            Backend::Local { model, .. } | Backend::Remote { model, .. } => model,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Local { endpoint, model } => f
                .debug_struct("Local")
                .field("endpoint", endpoint)
                .field("model", model)
                .finish(),
            Backend::Remote { model, .. } => f.debug_struct("Remote").field("model", model).finish(),
        }
    }
}

/// Decide local vs remote for `model`.
///
/// The server key wins over `header_key`; with neither, remote requests fail
/// with [`Error::MissingApiKey`].
pub fn resolve_backend(model: &str, config: &RelayConfig, header_key: Option<&str>) -> Result<Backend> {
    if let Some(local_model) = model.strip_prefix(LOCAL_MODEL_PREFIX) {
        if local_model.trim().is_empty() {
            return Err(Error::validation_with_context(
                "Local model name is empty",
                ErrorContext::new().with_field_path("model"),
            ));
        }
        return Ok(Backend::Local {
            endpoint: config.lmstudio_endpoint.clone(),
            model: local_model.to_string(),
        });
    }

    let api_key = config
        .openrouter_api_key
        .as_deref()
        .or(header_key)
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(Error::MissingApiKey)?;

    Ok(Backend::Remote {
        api_key: api_key.to_string(),
        model: model.to_string(),
    })
}

/// Map a transport failure against LM Studio to the local error kinds.
pub fn classify_local_error(err: Error, endpoint: &str) -> Error {
    match err {
        Error::Transport(ref t) if t.is_connect() => Error::LocalUnavailable {
            endpoint: endpoint.to_string(),
            details: t.to_string(),
        },
        Error::Transport(t) => Error::LocalFailed {
            details: t.to_string(),
        },
        other => other,
    }
}

/// A dispatched request's body, before HTTP framing.
pub enum RelayResponse {
    Json(Value),
    Stream(ByteStream),
}

impl std::fmt::Debug for RelayResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayResponse::Json(v) => f.debug_tuple("Json").field(v).finish(),
            RelayResponse::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[derive(Clone)]
pub struct BackendRouter {
    config: Arc<RelayConfig>,
    http: reqwest::Client,
    search: Arc<SearchExecutor>,
    capabilities: Arc<CapabilityTable>,
}

impl BackendRouter {
    pub fn new(config: Arc<RelayConfig>, http: reqwest::Client, search: Arc<SearchExecutor>) -> Self {
        Self {
            config,
            http,
            search,
            capabilities: CapabilityTable::shared(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Arc<CapabilityTable>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub async fn dispatch(&self, request: ChatRequest, header_key: Option<&str>) -> Result<RelayResponse> {
        request.validate()?;
        let backend = resolve_backend(&request.model, &self.config, header_key)?;
        info!(
            backend = backend.kind(),
            model = backend.model(),
            stream = request.stream,
            messages = request.messages.len(),
            "dispatching chat request"
        );

        match backend {
            Backend::Local { endpoint, model } => self.dispatch_local(request, &endpoint, model).await,
            Backend::Remote { api_key, model } => self.dispatch_remote(request, api_key, model).await,
        }
    }

    async fn dispatch_local(&self, request: ChatRequest, endpoint: &str, model: String) -> Result<RelayResponse> {
        let session = CompletionSession::new(UpstreamClient::local(self.http.clone(), endpoint), model)
            .with_capabilities(self.capabilities.clone())
            .with_sampling(request.sampling);
        let body = session.build_request(&request.messages, request.stream);

        let resp = session
            .upstream
            .send(&body)
            .await
            .map_err(|e| classify_local_error(e, endpoint))?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        if request.stream {
            debug!("piping local stream through unchanged");
            let body = resp
                .bytes_stream()
                .map_err(|e| Error::from(TransportError::from(e)));
            return Ok(RelayResponse::Stream(Box::pin(body)));
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| classify_local_error(TransportError::from(e).into(), endpoint))?;
        Ok(RelayResponse::Json(value))
    }

    async fn dispatch_remote(&self, request: ChatRequest, api_key: String, model: String) -> Result<RelayResponse> {
        let upstream = UpstreamClient::openrouter(self.http.clone(), &self.config, api_key);
        let tools = self.tools_for(&request);
        let session = CompletionSession::new(upstream, model)
            .with_capabilities(self.capabilities.clone())
            .with_sampling(request.sampling.clone())
            .with_reasoning(request.reasoning)
            .with_tools(tools);

        if request.stream {
            Ok(RelayResponse::Stream(streaming::spawn(session, request.messages)))
        } else {
            run_completion(&session, request.messages).await.map(RelayResponse::Json)
        }
    }

    /// Web search is offered only when enabled and a search key was sent.
    fn tools_for(&self, request: &ChatRequest) -> ToolSet {
        match (request.enable_auto_search, request.search_key()) {
            (true, Some(key)) => {
                let provider = request
                    .search_provider
                    .as_deref()
                    .filter(|p| !p.trim().is_empty())
                    .unwrap_or(DEFAULT_SEARCH_PROVIDER);
                ToolSet::new().add(Arc::new(SearchToolRunner::new(
                    self.search.clone(),
                    provider,
                    key,
                    request.search_settings.clone(),
                )))
            }
            _ => ToolSet::new(),
        }
    }
}
