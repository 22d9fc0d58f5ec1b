//! The HTTP transport: a single `POST /mcp` endpoint carrying JSON-RPC
//! request/response bodies, plus `GET /health` for load balancer probes.
//! Grounded in the router shape used by other Axum-based MCP servers in
//! this corpus: permissive CORS (the caller is typically a local tool
//! process, not a browser origin worth restricting) and request tracing.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::types::JsonRpcRequest;

struct HttpState {
    dispatcher: Arc<Dispatcher>,
    started_at: Instant,
}

/// Build the HTTP router.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    let state = Arc::new(HttpState {
        dispatcher,
        started_at: Instant::now(),
    });

    Router::new()
        .route("/mcp", post(handle_mcp))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_mcp(
    State(state): State<Arc<HttpState>>,
    Json(request): Json<JsonRpcRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.dispatcher.handle(request).await {
        Some(response) => (StatusCode::OK, Json(serde_json::to_value(response).unwrap())),
        None => (StatusCode::ACCEPTED, Json(json!({}))),
    }
}

async fn handle_health(State(state): State<Arc<HttpState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "uptime-ms": state.started_at.elapsed().as_millis() as u64,
        "connected": state.dispatcher.is_connected().await,
    }))
}
