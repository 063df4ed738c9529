//! HTTP transport for the mbti-flow MCP server
//!
//! MCP over Streamable HTTP mounted at the configured path, plus plain JSON
//! `/health` and `/info` endpoints. No authentication layer.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::get,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager,
    tower::{StreamableHttpServerConfig, StreamableHttpService},
};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::{MbtiError, Result};
use crate::server::MbtiServer;

const SSE_KEEPALIVE: Duration = Duration::from_secs(15);

/// Shared state for HTTP server
#[derive(Clone)]
pub struct HttpState {
    pub config: Arc<Config>,
    pub narrative_available: bool,
    pub metrics: Arc<Mutex<HttpMetrics>>,
}

/// Request counters for the MCP path
#[derive(Debug, Clone, Default)]
pub struct HttpMetrics {
    pub total_requests: u64,
    pub errors_total: u64,
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Info endpoint
pub async fn info_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let metrics = state.metrics.lock().await.clone();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        json!({
            "server": {
                "name": "mbti-flow",
                "version": env!("CARGO_PKG_VERSION"),
                "transport": state.config.runtime.transport,
                "bind": state.config.runtime.http_bind.to_string(),
                "path": state.config.runtime.http_path
            },
            "narrative": {
                "available": state.narrative_available,
                "model": state.config.narrative.model,
                "max_attempts": state.config.narrative.max_attempts
            },
            "questionnaire": {
                "default_length": state.config.questionnaire.length().count()
            },
            "requests": {
                "total": metrics.total_requests,
                "errors": metrics.errors_total
            }
        })
        .to_string(),
    )
}

/// Router with the MCP service nested at `runtime.http_path`
pub fn build_router(server: MbtiServer) -> Router {
    let state = HttpState {
        config: server.config.clone(),
        narrative_available: server.augmenter.is_available(),
        metrics: Arc::new(Mutex::new(HttpMetrics::default())),
    };

    let path = server.config.runtime.http_path.clone();
    let server_factory = server.clone();
    let mcp_service: StreamableHttpService<MbtiServer, _> = StreamableHttpService::new(
        move || Ok(server_factory.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            stateful_mode: true,
            sse_keep_alive: Some(SSE_KEEPALIVE),
            ..Default::default()
        },
    );

    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .nest_service(path.as_str(), mcp_service)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(middleware::from_fn_with_state(
            (state.metrics.clone(), path),
            |State((metrics, base)): State<(Arc<Mutex<HttpMetrics>>, String)>,
             req: axum::http::Request<Body>,
             next: axum::middleware::Next| async move {
                let is_mcp = req.uri().path().starts_with(&base);
                let resp = next.run(req).await;
                if is_mcp {
                    let mut m = metrics.lock().await;
                    m.total_requests = m.total_requests.saturating_add(1);
                    if !resp.status().is_success() {
                        m.errors_total = m.errors_total.saturating_add(1);
                    }
                }
                resp
            },
        ))
        .with_state(state)
}

pub async fn start_http_server(server: MbtiServer) -> Result<()> {
    let bind = server.config.runtime.http_bind;
    let path = server.config.runtime.http_path.clone();
    let app = build_router(server);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| MbtiError::Internal {
            message: format!("Failed to bind HTTP listener on {}: {}", bind, e),
        })?;

    tracing::info!("Starting HTTP server on {} (MCP at {})", bind, path);

    axum::serve(listener, app).await.map_err(|e| MbtiError::Internal {
        message: format!("HTTP server error: {}", e),
    })?;
    Ok(())
}
