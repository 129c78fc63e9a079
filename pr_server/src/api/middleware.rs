//! Player identity middleware for room endpoints.
//!
//! Clients identify themselves with a per-device id sent in the
//! `x-player-id` header. The id is checked for shape only; possession of
//! the id is what makes a player (or host) resume their seat.
//!
//! # Extracting the caller
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use pr_server::api::middleware::PlayerKey;
//!
//! async fn handler(Extension(caller): Extension<PlayerKey>) -> String {
//!     format!("Hello {}", caller.as_str())
//! }
//! # let _ = handler;
//! ```

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use poker_room::PlayerIdentity;

/// Header carrying the caller's player id
pub const PLAYER_ID_HEADER: &str = "x-player-id";

/// Authenticated caller, inserted into request extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerKey(pub String);

impl PlayerKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reject requests without a well-formed `x-player-id` header.
///
/// - **Valid id**: injects [`PlayerKey`] and calls the next handler
/// - **Missing or malformed**: returns `401 Unauthorized`
pub async fn identity_middleware(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let player_id = request
        .headers()
        .get(PLAYER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| PlayerIdentity::is_valid(id))
        .map(str::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(PlayerKey(player_id));
    Ok(next.run(request).await)
}
