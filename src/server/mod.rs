//! HTTP 服务层：axum 路由、错误映射与限流响应头。
//!
//! # Server
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /api/chat` | JSON completion, or `text/event-stream` when `stream` is set |
//! | `GET /api/health` | Liveness probe with the crate version |

pub mod error;
pub mod routes;

use std::net::SocketAddr;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::RelayConfig;
use crate::Result;

pub use error::{ApiError, ErrorBody};
pub use routes::{client_ip, create_router, AppState};

/// Relay server instance
pub struct RelayServer {
    bind_addr: SocketAddr,
    state: AppState,
}

impl RelayServer {
    pub fn new(config: RelayConfig) -> Result<Self> {
        let bind_addr = config.bind_addr;
        Ok(Self {
            bind_addr,
            state: AppState::new(config)?,
        })
    }

    /// Routes plus CORS and request tracing.
    pub fn app(&self) -> Router {
        build_app(self.state.clone())
    }

    /// Bind and serve until the process is stopped.
    pub async fn start(self) -> Result<()> {
        let app = self.app();
        let listener = tokio::net::TcpListener::bind(&self.bind_addr).await?;
        info!(addr = %self.bind_addr, "chat relay listening");
        info!("   API endpoint: http://{}/api/chat", self.bind_addr);

        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
        Ok(())
    }
}

pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
