//! Prometheus metrics for monitoring room activity.
//!
//! Metrics are exposed in Prometheus text format on the address given by
//! `METRICS_BIND`.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pr_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::player_actions_total("call");
//! metrics::websocket_connections_active(3);
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
// Room Metrics
// ============================================================================

/// Increment rooms created counter.
pub fn rooms_created_total() {
    metrics::counter!("rooms_created_total").increment(1);
}

/// Increment accepted player actions counter.
pub fn player_actions_total(action: &str) {
    metrics::counter!("player_actions_total",
        "action" => action.to_string()
    )
    .increment(1);
}

/// Increment declined operations counter.
pub fn rejections_total(operation: &str) {
    metrics::counter!("rejections_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Increment host operations counter.
pub fn host_actions_total(operation: &str) {
    metrics::counter!("host_actions_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record pot size distribution.
pub fn pot_size_chips(size: i64) {
    metrics::histogram!("pot_size_chips").record(size as f64);
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
pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(endpoint: &str) {
    metrics::counter!("rate_limit_hits_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}
