//! WebSocket server for the System Sync card game.
//!
//! Binds the room registry from `system_sync` to an axum router: `/ws`
//! speaks the game protocol, `/health` reports liveness.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
