//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the HTTP board API and the websocket endpoint under a
//! single Axum router. When a static directory is configured, the browser
//! client is served from it as the fallback.

pub mod board;
pub mod ws;

use std::path::Path;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Board API and websocket routes.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/draw", post(board::draw))
        .route("/api/board", get(board::board))
        .route("/api/clear", post(board::clear))
        .route("/api/randomColor", get(board::random_color))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `app` plus the browser client served from `static_dir`.
pub fn app_with_static(state: AppState, static_dir: &Path) -> Router {
    let website_service = ServeDir::new(static_dir).append_index_html_on_directories(true);
    app(state).fallback_service(website_service)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// TEST HELPERS
// =============================================================================
