//! HTTP and WebSocket front end for poker rooms.
//!
//! Exposes the room controller over a versioned REST API and streams each
//! room's change feed to WebSocket subscribers.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
