use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use cairn_core::Node;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handler::{self, AppState};

/// Build the axum router with all cairn endpoints.
pub fn build_router(node: Arc<Node>, config: ServerConfig) -> Router {
    // One byte of slack lets block/put report an oversized body itself.
    let body_limit = usize::try_from(config.max_block_size.saturating_add(1)).unwrap_or(usize::MAX);
    let state = AppState {
        node,
        config: Arc::new(config),
    };
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/api/v0/block/stat", post(handler::block_stat))
        .route("/api/v0/block/get", post(handler::block_get))
        .route("/api/v0/block/put", post(handler::block_put))
        .route("/api/v0/block/rm", post(handler::block_rm))
        .route("/api/v0/cat", post(handler::cat))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
