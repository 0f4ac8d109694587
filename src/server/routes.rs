use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::error::ApiError;
use crate::cache::TtlCache;
use crate::config::{RelayConfig, LOCAL_MODEL_PREFIX};
use crate::resilience::{RateLimiter, RateLimiterConfig};
use crate::routing::{BackendRouter, RelayResponse};
use crate::search::{SearchEndpoints, SearchExecutor};
use crate::transport::build_http_client;
use crate::types::ChatRequest;
use crate::{Error, Result};

/// Header carrying a client-supplied OpenRouter key.
pub const OPENROUTER_KEY_HEADER: &str = "x-openrouter-key";

/// Application state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub router: BackendRouter,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self> {
        Self::with_search_endpoints(config, SearchEndpoints::default())
    }

    /// Build state with search providers at custom base URLs.
    pub fn with_search_endpoints(config: RelayConfig, endpoints: SearchEndpoints) -> Result<Self> {
        config.validate()?;
        let http = build_http_client(config.upstream_timeout)?;
        let cache = Arc::new(TtlCache::new(config.search_cache_ttl));
        let search = Arc::new(SearchExecutor::new(http.clone(), cache).with_endpoints(endpoints));
        let limiter = Arc::new(RateLimiter::new(RateLimiterConfig::new(
            config.rate_limit,
            config.rate_window,
        )));

        Ok(Self {
            router: BackendRouter::new(Arc::new(config), http, search),
            limiter,
        })
    }
}

/// Create router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .with_state(state)
}

/// GET /api/health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /api/chat - JSON completion or SSE stream
async fn chat(
    State(state): State<AppState>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Response, ApiError> {
    let client_ip = client_ip(&headers, connect.map(|ConnectInfo(addr)| addr));
    let decision = state.limiter.check(&client_ip).await;
    if !decision.allowed {
        tracing::warn!(client_ip = %client_ip, "rate limit exceeded");
        return Err(ApiError::RateLimited(decision));
    }

    let request: ChatRequest = serde_json::from_slice(&body).map_err(Error::from)?;
    let backend = if request.model.starts_with(LOCAL_MODEL_PREFIX) {
        "local"
    } else {
        "remote"
    };
    let span = info_span!(
        "chat",
        request_id = %Uuid::new_v4(),
        model = %request.model,
        backend
    );

    let header_key = remote_key(&headers);
    let response = state
        .router
        .dispatch(request, header_key.as_deref())
        .instrument(span)
        .await?;

    Ok(match response {
        RelayResponse::Json(value) => (StatusCode::OK, Json(value)).into_response(),
        RelayResponse::Stream(stream) => (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
            ],
            Body::from_stream(stream),
        )
            .into_response(),
    })
}

/// First `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header_value("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    if let Some(real) = header_value("x-real-ip") {
        return real.to_string();
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// OpenRouter key sent by the client, if any.
fn remote_key(headers: &HeaderMap) -> Option<String> {
    let explicit = headers
        .get(OPENROUTER_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let bearer = || {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    explicit.or_else(bearer).map(str::to_string)
}
