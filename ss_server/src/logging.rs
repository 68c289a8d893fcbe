//! Structured logging configuration.
//!
//! Library code logs through the `log` facade; the subscriber installed here
//! also picks those records up, so room and match logs share one output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,tower_http=warn,hyper=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use ss_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a client message the server refused before it reached a room
pub fn log_refused_message(connection_id: &str, code: &str, detail: &str) {
    tracing::warn!(
        connection_id = connection_id,
        code = code,
        "Refused client message: {}",
        detail
    );
}

/// Log a room action rejected by the game rules
pub fn log_rejected_action(connection_id: &str, action: &str, code: &str) {
    tracing::debug!(
        connection_id = connection_id,
        action = action,
        code = code,
        "Action rejected"
    );
}
