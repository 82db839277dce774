//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the one `BoardStore` for the process and the broadcast sender
//! that fans board events out to websocket subscribers. Both the HTTP and
//! websocket adapters reference the same store through cheap clones.
//!
//! CONCURRENCY
//! ===========
//! The store is copy-on-write: the action sequence lives behind an `Arc`
//! and the lock only guards the pointer and a revision counter. A snapshot
//! clones the `Arc` and drops the lock immediately, so readers never hold
//! the lock while serializing. An append goes through `Arc::make_mut`, which
//! copies the backing vector only while an older snapshot is still alive.

use std::num::NonZeroUsize;
use std::ops::Deref;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::services::board::BoardEvent;

// =============================================================================
// DRAWING ACTION
// =============================================================================

/// One point drawn on the board, or a request to wipe it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingAction {
    pub x: f64,
    pub y: f64,
    pub color: String,
    /// When set, the action wipes the board and is never stored.
    #[serde(default)]
    pub clear: bool,
}

impl DrawingAction {
    #[must_use]
    pub fn point(x: f64, y: f64, color: impl Into<String>) -> Self {
        Self { x, y, color: color.into(), clear: false }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Immutable view of the board at one revision.
///
/// Shares storage with the store until the next mutation, at which point the
/// store copies and the snapshot keeps the old vector.
#[derive(Debug, Clone)]
pub struct Snapshot {
    actions: Arc<Vec<DrawingAction>>,
    revision: u64,
}

impl Snapshot {
    /// Store revision this snapshot was taken at.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<DrawingAction> {
        self.actions.as_ref().clone()
    }
}

impl Deref for Snapshot {
    type Target = [DrawingAction];

    fn deref(&self) -> &Self::Target {
        &self.actions
    }
}

impl Serialize for Snapshot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.actions.as_slice().serialize(serializer)
    }
}

// =============================================================================
// BOARD STORE
// =============================================================================

struct Timeline {
    actions: Arc<Vec<DrawingAction>>,
    /// Bumped by every mutation, including resets of an empty board.
    revision: u64,
}

/// Ordered, thread-safe log of drawing actions. Clones share the same board.
#[derive(Clone)]
pub struct BoardStore {
    inner: Arc<RwLock<Timeline>>,
    history_limit: Option<NonZeroUsize>,
}

impl BoardStore {
    /// Create an empty, unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_limit(None)
    }

    /// Create an empty store that keeps at most `limit` actions, evicting the
    /// oldest first. `None` keeps everything.
    #[must_use]
    pub fn with_history_limit(limit: Option<NonZeroUsize>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Timeline { actions: Arc::new(Vec::new()), revision: 0 })),
            history_limit: limit,
        }
    }

    #[must_use]
    pub fn history_limit(&self) -> Option<NonZeroUsize> {
        self.history_limit
    }

    /// Append `action`, or wipe the board if `action.clear` is set.
    pub fn submit(&self, action: DrawingAction) {
        if action.clear {
            self.reset();
            return;
        }

        let mut timeline = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let actions = Arc::make_mut(&mut timeline.actions);
        actions.push(action);
        if let Some(limit) = self.history_limit {
            let excess = actions.len().saturating_sub(limit.get());
            if excess > 0 {
                actions.drain(..excess);
            }
        }
        timeline.revision += 1;
    }

    /// Empty the board. Safe to call on an empty board.
    pub fn reset(&self) {
        let mut timeline = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        // Swap rather than clear: outstanding snapshots keep the old vector.
        timeline.actions = Arc::new(Vec::new());
        timeline.revision += 1;
    }

    /// Current board contents. Later mutations never show through.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let timeline = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Snapshot { actions: Arc::clone(&timeline.actions), revision: timeline.revision }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .actions
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .revision
    }
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub board: BoardStore,
    /// Fan-out of applied mutations to websocket subscribers.
    pub events: broadcast::Sender<BoardEvent>,
    /// Serializes store mutation + publish so event order matches store order.
    pub publish_lock: Arc<Mutex<()>>,
}

impl AppState {
    #[must_use]
    pub fn new(board: BoardStore, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self { board, events, publish_lock: Arc::new(Mutex::new(())) }
    }

    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(BoardStore::with_history_limit(config.history_limit), config.event_buffer)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// Create a test `AppState` with an unbounded board and a small event buffer.
    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(BoardStore::new(), 64)
    }

    /// Action with the clear flag set and meaningless coordinates.
    #[must_use]
    pub fn clear_command() -> DrawingAction {
        DrawingAction { x: 0.0, y: 0.0, color: String::new(), clear: true }
    }

    /// Red point at `(x, y)`.
    #[must_use]
    pub fn red_point(x: f64, y: f64) -> DrawingAction {
        DrawingAction::point(x, y, "#ff0000")
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
