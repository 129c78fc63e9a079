//! Structured logging configuration.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info,sqlx=warn,hyper=warn`.
/// Records emitted through the `log` facade by the room library are picked up
/// by the subscriber as well.
///
/// # Example
///
/// ```no_run
/// use pr_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

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

/// Log a declined room operation
pub fn log_rejection(room_id: &str, player_id: Option<&str>, operation: &str, reason: &str) {
    tracing::warn!(
        room_id = room_id,
        player_id = player_id,
        operation = operation,
        "Rejected: {}",
        reason
    );
}

/// Log a host operation
pub fn log_host_action(room_id: &str, operation: &str, detail: &str) {
    tracing::info!(
        room_id = room_id,
        operation = operation,
        "Host action: {}",
        detail
    );
}
