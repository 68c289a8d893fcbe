//! HTTP/WebSocket API for the game server.
//!
//! # Modules
//!
//! - [`websocket`]: The game protocol, one session per connection
//! - [`flood_guard`]: Per-connection message rate windows
//!
//! # Endpoints Overview
//!
//! - `GET /ws` - Establish WebSocket connection
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ss_server::{api::{AppState, create_router}, config::ServerConfig};
//! use system_sync::RoomManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::default();
//! let state = AppState::new(RoomManager::new(config.manager_settings()), config);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod flood_guard;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use serde_json::json;
use std::sync::{Arc, atomic::AtomicU64};
use system_sync::RoomManager;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned per request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Room registry
    pub rooms: RoomManager,
    pub config: Arc<ServerConfig>,
    /// Open websocket connections
    pub connections: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(rooms: RoomManager, config: ServerConfig) -> Self {
        Self {
            rooms,
            config: Arc::new(config),
            connections: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Create the API router with all endpoints and middleware.
///
/// ```text
/// GET  /health    - Health check
/// GET  /ws        - WebSocket game protocol
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","version":"1.0.0","rooms":2,"timestamp":"2026-01-22T10:30:00+00:00"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "rooms": state.rooms.room_count().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
