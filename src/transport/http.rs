use crate::config::RelayConfig;
use crate::protocol::CompletionRequest;
use crate::{Error, Result};
use std::time::Duration;
use tracing::debug;

/// Shared reqwest client used for model backends and search providers.
///
/// No request timeout unless one is configured: a streamed completion can
/// legitimately run for minutes.
pub fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .pool_max_idle_per_host(32)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        // Conservative HTTP/2 keepalive defaults for long-lived streams.
        .http2_adaptive_window(true)
        .http2_keep_alive_interval(Some(Duration::from_secs(30)))
        .http2_keep_alive_timeout(Duration::from_secs(10));

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))
}

/// An OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    /// (`HTTP-Referer`, `X-Title`) sent to OpenRouter for app attribution.
    attribution: Option<(String, String)>,
}

impl UpstreamClient {
    pub fn openrouter(client: reqwest::Client, config: &RelayConfig, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: config.openrouter_base_url.clone(),
            api_key: Some(api_key.into()),
            attribution: Some((config.app_url.clone(), config.app_title.clone())),
        }
    }

    /// LM Studio: no auth, no attribution.
    pub fn local(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            base_url: endpoint.into(),
            api_key: None,
            attribution: None,
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// POST the body and return the response whatever its status.
    pub async fn send(&self, body: &CompletionRequest) -> Result<reqwest::Response> {
        let url = self.completions_url();
        let mut req = self.client.post(&url).json(body);

        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        if let Some((referer, title)) = &self.attribution {
            req = req.header("HTTP-Referer", referer).header("X-Title", title);
        }
        if body.stream {
            req = req.header("accept", "text/event-stream");
        }

        debug!(
            url = %url,
            model = %body.model,
            stream = body.stream,
            tools = body.has_tools(),
            messages = body.messages.len(),
            "sending completion request"
        );

        req.send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))
    }

    /// POST and turn any non-2xx answer into [`Error::Remote`].
    pub async fn send_checked(&self, body: &CompletionRequest) -> Result<reqwest::Response> {
        let resp = self.send(body).await?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(error_from_response(resp).await)
        }
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.api_key.is_some())
            .finish()
    }
}

/// Read a failed response body into an error that keeps the upstream status.
pub async fn error_from_response(resp: reqwest::Response) -> Error {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    debug!(http_status = status, "upstream returned an error");
    Error::from_upstream_body(status, &body)
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// The connection itself could not be established.
    pub fn is_connect(&self) -> bool {
        matches!(self, TransportError::Http(e) if e.is_connect())
    }
}
