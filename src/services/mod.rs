//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the board mutation path so route handlers can stay
//! focused on protocol translation.

pub mod board;
pub mod color;
