//! Internal modules for the poker room client.
//!
//! Command parsing, the HTTP API client and the change-feed session used by
//! the pr_client binary.

pub mod api_client;
pub mod commands;
pub mod websocket_client;
