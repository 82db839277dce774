//! WebSocket handler: publish/subscribe relay for board events.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID, subscribes to the board event channel,
//! and enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by destination
//! - Board events → forward to client if it subscribed to the event's topic
//!
//! Dispatch is pure with respect to the socket: it mutates the board through
//! the board service and returns the frames owed to the sender. Fan-out to
//! every subscriber (sender included) happens through the event channel.
//!
//! Whenever the connection hands the client a full board (a `board` reply or
//! a `board:sync` after lagging), its event receiver is replaced in the same
//! critical section that took the snapshot. The client therefore never sees
//! an event the snapshot already contains, and never misses one after it.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id`
//! 2. Client sends `subscribe` for `/topic/board` and/or `/topic/clear`
//! 3. Client sends `draw` / `clear` → done reply, event to all subscribers
//! 4. Close → drop the event receiver

use std::collections::HashSet;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::frame::{Data, ErrorCode, FRAME_CODE, FRAME_MESSAGE, Frame, Status};
use crate::services;
use crate::services::board::{BoardEvent, Topic};
use crate::state::{AppState, DrawingAction, Snapshot};

/// Prefix STOMP-style clients put in front of application destinations.
const APP_DESTINATION_PREFIX: &str = "/app/";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid frame: {0}")]
    InvalidFrame(serde_json::Error),
    #[error("invalid drawing action: {0}")]
    InvalidAction(serde_json::Error),
    #[error("unknown destination: {0}")]
    UnknownDestination(String),
    #[error("topic required")]
    MissingTopic,
    #[error("unknown topic: {0}")]
    UnknownTopic(String),
}

impl ErrorCode for GatewayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFrame(_) => "E_INVALID_FRAME",
            Self::InvalidAction(_) => "E_INVALID_ACTION",
            Self::UnknownDestination(_) => "E_UNKNOWN_DESTINATION",
            Self::MissingTopic => "E_MISSING_TOPIC",
            Self::UnknownTopic(_) => "E_UNKNOWN_TOPIC",
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Per-connection subscription state: requested topics and the position in
/// the board event stream.
struct Session {
    topics: HashSet<Topic>,
    events: broadcast::Receiver<BoardEvent>,
}

impl Session {
    fn new(state: &AppState) -> Self {
        Self { topics: HashSet::new(), events: services::board::subscribe(state) }
    }

    /// Restart the event stream at the current board and return that board.
    fn resync(&mut self, state: &AppState) -> Snapshot {
        let (events, snapshot) = services::board::subscribe_with_snapshot(state);
        self.events = events;
        snapshot
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Subscribe before the welcome so nothing published after it is missed.
    let mut session = Session::new(&state);

    let welcome = Frame::request("session:connected", Data::new()).with_data("client_id", client_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(%client_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies = process_inbound_text(&state, &mut session, client_id, text.as_str());
                        for frame in replies {
                            let _ = send_frame(&mut socket, &frame).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            event = session.events.recv() => {
                let frame = match event {
                    Ok(event) => {
                        if !session.topics.contains(&event.topic()) {
                            continue;
                        }
                        event.to_frame()
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%client_id, skipped, "ws: subscriber lagged, resyncing");
                        // Drop the stale backlog even when nothing is subscribed.
                        let snapshot = session.resync(&state);
                        if session.topics.is_empty() {
                            continue;
                        }
                        sync_frame(&snapshot)
                    }
                    Err(RecvError::Closed) => break,
                };
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the sender.
///
/// Keeps the websocket transport separate from frame handling so tests can
/// drive dispatch without a socket.
fn process_inbound_text(state: &AppState, session: &mut Session, client_id: Uuid, text: &str) -> Vec<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            return vec![gateway_error(&GatewayError::InvalidFrame(e))];
        }
    };

    let destination = req
        .destination
        .strip_prefix(APP_DESTINATION_PREFIX)
        .unwrap_or(&req.destination);

    if destination == "draw" {
        debug!(%client_id, id = %req.id, "ws: recv draw");
    } else {
        info!(%client_id, id = %req.id, destination, "ws: recv frame");
    }

    let result = match destination {
        "draw" => handle_draw(state, &req),
        "clear" => {
            services::board::clear(state);
            Ok(req.done())
        }
        "board" => {
            let snapshot = session.resync(state);
            Ok(req.done_with(snapshot_data(&snapshot)))
        }
        "subscribe" => parse_topic(&req).map(|topic| {
            session.topics.insert(topic);
            req.done()
        }),
        "unsubscribe" => parse_topic(&req).map(|topic| {
            session.topics.remove(&topic);
            req.done()
        }),
        other => Err(GatewayError::UnknownDestination(other.to_string())),
    };

    match result {
        Ok(reply) => vec![reply],
        Err(e) => vec![req.error_from(&e)],
    }
}

fn handle_draw(state: &AppState, req: &Frame) -> Result<Frame, GatewayError> {
    let action: DrawingAction = serde_json::from_value(req.data_value()).map_err(GatewayError::InvalidAction)?;
    if action.clear {
        info!(id = %req.id, "ws: clear via draw");
    }
    services::board::draw(state, action);
    Ok(req.done())
}

fn parse_topic(req: &Frame) -> Result<Topic, GatewayError> {
    let Some(raw) = req.data_str("topic") else {
        return Err(GatewayError::MissingTopic);
    };
    Topic::parse(raw).ok_or_else(|| GatewayError::UnknownTopic(raw.to_string()))
}

// =============================================================================
// HELPERS
// =============================================================================

fn snapshot_data(snapshot: &Snapshot) -> Data {
    let mut data = Data::new();
    data.insert("actions".into(), serde_json::to_value(snapshot).unwrap_or_default());
    data.insert("revision".into(), serde_json::json!(snapshot.revision()));
    data
}

/// Full board pushed to a subscriber that fell behind the event channel.
fn sync_frame(snapshot: &Snapshot) -> Frame {
    Frame::request("board:sync", snapshot_data(snapshot))
}

/// Error frame for input that never became a request frame.
fn gateway_error(err: &GatewayError) -> Frame {
    let mut frame = Frame::request("gateway:error", Data::new())
        .with_data(FRAME_CODE, err.error_code())
        .with_data(FRAME_MESSAGE, err.to_string());
    frame.status = Status::Error;
    frame
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.status == Status::Error {
        let code = frame.data_str(FRAME_CODE).unwrap_or("-");
        let message = frame.data_str(FRAME_MESSAGE).unwrap_or("-");
        warn!(id = %frame.id, destination = %frame.destination, code, message, "ws: send frame status=Error");
    }
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
