//! Networking layer for client-server communication.
//!
//! This module defines the JSON protocol spoken over the websocket and the
//! per-connection session that relays requests into rooms. The transport
//! itself lives in the server crate.

/// Protocol decode errors.
pub mod errors;

/// Message types for client-server communication protocol.
pub mod messages;

/// Per-connection request dispatch.
pub mod session;

/// Utilities for JSON message framing.
pub mod utils;
