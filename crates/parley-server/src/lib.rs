//! Parley server library logic.

pub mod api;
pub mod api_sse;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Extension, Json, Router,
};
use parley_session::SessionHandle;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The voice/chat session every route operates on.
    pub session: SessionHandle,
}

/// Maximum request body size (64 KiB). Messages and agent events are small.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/session", get(api::get_session_handler))
        .route("/api/session/connect", post(api::connect_handler))
        .route("/api/session/disconnect", post(api::disconnect_handler))
        .route("/api/session/toggle", post(api::toggle_connection_handler))
        .route(
            "/api/messages",
            get(api::list_messages_handler).post(api::send_message_handler),
        )
        .route("/api/controls/{control}", put(api::set_control_handler))
        .route("/api/events", post(api::ingest_event_handler))
        .route("/events/session", get(api_sse::get_session_stream_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
