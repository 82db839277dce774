//! Board service: the single mutation path for both transports.
//!
//! DESIGN
//! ======
//! HTTP handlers and websocket frames both land here. Each mutation is
//! applied to the `BoardStore` and the matching `BoardEvent` is published
//! on the broadcast channel while `publish_lock` is held, so subscribers
//! observe events in exactly the order the store applied them.
//!
//! Publishing never waits: `broadcast::Sender::send` only fails when there
//! are no subscribers, which is the normal state of an idle board.

use std::sync::PoisonError;

use tokio::sync::broadcast;
use tracing::debug;

use crate::frame::{Data, Frame};
use crate::state::{AppState, DrawingAction, Snapshot};

/// Topic carrying every accepted drawing action.
pub const TOPIC_BOARD: &str = "/topic/board";

/// Topic carrying clear notifications.
pub const TOPIC_CLEAR: &str = "/topic/clear";

/// Payload published on `TOPIC_CLEAR`.
pub const CLEARED: &str = "CLEARED";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Board,
    Clear,
}

impl Topic {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Board => TOPIC_BOARD,
            Self::Clear => TOPIC_CLEAR,
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            TOPIC_BOARD => Some(Self::Board),
            TOPIC_CLEAR => Some(Self::Clear),
            _ => None,
        }
    }
}

/// A mutation that has been applied to the board.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    /// An action accepted by the board, re-published as received.
    Drawn(DrawingAction),
    /// The board was wiped.
    Cleared,
}

impl BoardEvent {
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            Self::Drawn(_) => Topic::Board,
            Self::Cleared => Topic::Clear,
        }
    }

    /// Frame pushed to subscribers of this event's topic.
    #[must_use]
    pub fn to_frame(&self) -> Frame {
        match self {
            Self::Drawn(action) => Frame::request(TOPIC_BOARD, action_to_data(action)),
            Self::Cleared => Frame::request(TOPIC_CLEAR, Data::new()).with_content(CLEARED),
        }
    }
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// Submit `action` to the board and publish it on `/topic/board`.
///
/// An action with `clear` set wipes the board; it is still published on the
/// board topic so clients can wipe their own canvas.
pub fn draw(state: &AppState, action: DrawingAction) -> BoardEvent {
    let event = BoardEvent::Drawn(action.clone());
    let _order = state
        .publish_lock
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    state.board.submit(action);
    publish(state, &event);
    event
}

/// Wipe the board and publish `CLEARED` on `/topic/clear`.
pub fn clear(state: &AppState) -> BoardEvent {
    let event = BoardEvent::Cleared;
    let _order = state
        .publish_lock
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    state.board.reset();
    publish(state, &event);
    event
}

/// Current board contents.
#[must_use]
pub fn snapshot(state: &AppState) -> Snapshot {
    state.board.snapshot()
}

/// Receive every event published after this call.
#[must_use]
pub fn subscribe(state: &AppState) -> broadcast::Receiver<BoardEvent> {
    state.events.subscribe()
}

/// Fresh receiver together with the board it starts from.
///
/// Both are taken under `publish_lock`: the snapshot holds exactly the
/// mutations published before the receiver's first event.
#[must_use]
pub fn subscribe_with_snapshot(state: &AppState) -> (broadcast::Receiver<BoardEvent>, Snapshot) {
    let _order = state
        .publish_lock
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    (state.events.subscribe(), state.board.snapshot())
}

// =============================================================================
// HELPERS
// =============================================================================

fn publish(state: &AppState, event: &BoardEvent) {
    let receivers = state.events.send(event.clone()).unwrap_or(0);
    debug!(
        topic = event.topic().as_str(),
        receivers,
        actions = state.board.len(),
        revision = state.board.revision(),
        "board: published"
    );
}

/// Flatten an action into frame data.
#[must_use]
pub fn action_to_data(action: &DrawingAction) -> Data {
    let mut data = Data::new();
    data.insert("x".into(), serde_json::json!(action.x));
    data.insert("y".into(), serde_json::json!(action.y));
    data.insert("color".into(), serde_json::json!(action.color));
    data.insert("clear".into(), serde_json::json!(action.clear));
    data
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
