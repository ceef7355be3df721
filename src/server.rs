//! MCP HTTP server.
//!
//! Mounts the `rmcp` streamable-HTTP transport at `/mcp`, a `/health`
//! endpoint, and static-file serving for any directories registered via
//! `registerDirectory`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-based and
//! cross-origin MCP clients can connect without a proxy.

use std::sync::Arc;

use anyhow::Result;
use axum::routing::get;
use axum::Router;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::dirquery;
use crate::mcp::McpBridge;
use crate::traits::{ToolContext, ToolRegistry};

pub async fn run_server(config: Config, ctx: ToolContext) -> Result<()> {
    run_server_with_registry(config, ctx, ToolRegistry::with_builtins()).await
}

/// Same as [`run_server`], but with a caller-supplied registry instead of
/// the built-in tool set — lets a downstream binary register extra `Tool`s
/// alongside NimGenie's own.
pub async fn run_server_with_registry(config: Config, ctx: ToolContext, registry: ToolRegistry) -> Result<()> {
    let config = Arc::new(config);
    let tool_ctx = Arc::new(ctx);
    let tools = Arc::new(registry);

    let mcp_service = StreamableHttpService::new(
        move || Ok(McpBridge::new(tools.clone(), tool_ctx.clone())),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let registered_dirs = tool_ctx_registered_dirs(&tool_ctx).await;
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .nest_service("/mcp", mcp_service)
        .merge(dirquery::static_router(&registered_dirs))
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "nimgenie MCP server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn tool_ctx_registered_dirs(_ctx: &Arc<ToolContext>) -> Vec<crate::models::RegisteredDirectory> {
    // Directories registered after startup are served lazily per-request by
    // dirquery's store-backed lookup in a future iteration; at startup we
    // have no project scoped yet, so the static mount starts empty.
    Vec::new()
}

async fn health() -> &'static str {
    concat!("nimgenie ", env!("CARGO_PKG_VERSION"))
}
