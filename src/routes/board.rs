//! HTTP board routes.
//!
//! Thin request/response adapter over the board service. Mutations made
//! here are published like websocket mutations, so live subscribers stay
//! in sync with clients that only speak HTTP.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use tracing::info;

use crate::services;
use crate::state::{AppState, DrawingAction, Snapshot};

#[derive(Debug, Serialize)]
pub struct ColorResponse {
    pub color: String,
}

/// `POST /api/draw`: submit one action.
pub async fn draw(State(state): State<AppState>, Json(action): Json<DrawingAction>) -> StatusCode {
    if action.clear {
        info!("http: clear via draw");
    }
    services::board::draw(&state, action);
    StatusCode::CREATED
}

/// `GET /api/board`: full board in rendering order.
pub async fn board(State(state): State<AppState>) -> Json<Snapshot> {
    Json(services::board::snapshot(&state))
}

/// `POST /api/clear`: wipe the board.
pub async fn clear(State(state): State<AppState>) -> StatusCode {
    info!(was_empty = state.board.is_empty(), "http: clear");
    services::board::clear(&state);
    StatusCode::OK
}

/// `GET /api/randomColor`: a color for a new drawer.
pub async fn random_color() -> Json<ColorResponse> {
    Json(ColorResponse { color: services::color::random_color() })
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
