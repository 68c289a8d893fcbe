//! Prometheus metrics for monitoring server health and match activity.
//!
//! Metrics are exposed in Prometheus text format on a separate listener,
//! enabled by `METRICS_BIND` / `--metrics`. Without an installed recorder
//! every call here is a no-op.
//!
//! # Metrics Categories
//!
//! - **WebSocket Metrics**: Active connections, messages sent/received
//! - **Room Metrics**: Active rooms, matches started and finished
//! - **Rejection Metrics**: Rejected actions by code, flood guard hits
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ss_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::websocket_connections_total();
//! metrics::active_rooms(3);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Set current active WebSocket connections count.
pub fn websocket_connections_active(count: u64) {
    metrics::gauge!("websocket_connections_active").set(count as f64);
}

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Increment WebSocket messages sent counter.
pub fn websocket_messages_sent(kind: &'static str) {
    metrics::counter!("websocket_messages_sent", "type" => kind).increment(1);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

// ============================================================================
// Room Metrics
// ============================================================================

/// Set current active rooms count.
pub fn active_rooms(count: usize) {
    metrics::gauge!("active_rooms").set(count as f64);
}

/// Increment matches started counter.
pub fn matches_started_total() {
    metrics::counter!("matches_started_total").increment(1);
}

/// Increment matches finished counter.
pub fn matches_finished_total() {
    metrics::counter!("matches_finished_total").increment(1);
}

// ============================================================================
// Rejection Metrics
// ============================================================================

/// Increment rejected actions counter, labelled with the rejection code.
pub fn rejected_actions_total(code: &str) {
    metrics::counter!("rejected_actions_total",
        "code" => code.to_string()
    )
    .increment(1);
}

/// Increment flood guard hits counter.
pub fn flood_guard_hits_total(window: &'static str) {
    metrics::counter!("flood_guard_hits_total", "window" => window).increment(1);
}
