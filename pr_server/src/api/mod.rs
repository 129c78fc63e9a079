//! HTTP/WebSocket API for poker rooms.
//!
//! # Modules
//!
//! - [`rooms`]: creating, joining and resuming rooms, staging bets and
//!   player actions
//! - [`host`]: pot and stage controls reserved for the room's host
//! - [`websocket`]: per-room change feed and gesture relay
//! - [`middleware`]: `x-player-id` identity check for room endpoints
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                                    - Health check
//! GET  /ws/{room_id}?player_id=<id>               - Room change feed
//! GET  /api/v1/rooms/{room_id}                    - Room snapshot
//! POST /api/v1/rooms                              - Create room (caller hosts)
//! GET  /api/v1/rooms/{room_id}/check              - Membership and seat check
//! POST /api/v1/rooms/{room_id}/join               - Take a seat
//! POST /api/v1/rooms/{room_id}/resume             - Resume a saved seat
//! POST /api/v1/rooms/{room_id}/stage              - Stage chips
//! POST /api/v1/rooms/{room_id}/clear              - Return staged chips
//! POST /api/v1/rooms/{room_id}/confirm            - Commit staged chips
//! POST /api/v1/rooms/{room_id}/action             - Fold, check, call, bet/raise
//! POST /api/v1/rooms/{room_id}/host/collect       - Sweep bets into the pot
//! POST /api/v1/rooms/{room_id}/host/distribute    - Award the pot
//! POST /api/v1/rooms/{room_id}/host/advance       - Next stage
//! POST /api/v1/rooms/{room_id}/host/new-round     - Reset and move the button
//! POST /api/v1/rooms/{room_id}/host/dealer        - Place the button
//! POST /api/v1/rooms/{room_id}/host/move-button   - Button to the next seat
//! POST /api/v1/rooms/{room_id}/host/status        - Overwrite the stage
//! POST /api/v1/rooms/{room_id}/host/start-round   - Open a betting round
//! ```

pub mod host;
pub mod middleware;
pub mod rate_limiter;
pub mod request_id;
pub mod rooms;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use poker_room::{Database, RoomController, RoomError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{logging, metrics};

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<RoomController>,
    /// Present when rooms are stored in PostgreSQL
    pub database: Option<Database>,
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// HTTP status for a room error
pub fn status_for(err: &RoomError) -> StatusCode {
    match err {
        RoomError::RoomNotFound(_) | RoomError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
        RoomError::NotHost => StatusCode::FORBIDDEN,
        RoomError::SeatTaken(_)
        | RoomError::RoomExists(_)
        | RoomError::NotYourTurn
        | RoomError::NoActiveRound => StatusCode::CONFLICT,
        RoomError::Database(_) | RoomError::CodeSpaceExhausted(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Log, count and convert a room error for the client.
pub(crate) fn reject(
    room_id: &str,
    caller: Option<&str>,
    operation: &str,
    err: RoomError,
) -> ApiError {
    if err.is_rejection() {
        logging::log_rejection(room_id, caller, operation, &err.to_string());
        metrics::rejections_total(operation);
    } else {
        tracing::error!(room_id = room_id, operation = operation, "Room operation failed: {}", err);
    }

    (
        status_for(&err),
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let root_routes = Router::new()
        .route("/health", get(health_check))
        // Subscribers identify themselves in the query string
        .route("/ws/{room_id}", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    let public_routes = Router::new().route("/rooms/{room_id}", get(rooms::get_room));

    let player_routes = Router::new()
        .route("/rooms", post(rooms::create_room))
        .route("/rooms/{room_id}/check", get(rooms::check_room))
        .route("/rooms/{room_id}/join", post(rooms::join_room))
        .route("/rooms/{room_id}/resume", post(rooms::resume))
        .route("/rooms/{room_id}/stage", post(rooms::stage_bet))
        .route("/rooms/{room_id}/clear", post(rooms::clear_bet))
        .route("/rooms/{room_id}/confirm", post(rooms::confirm_bet))
        .route("/rooms/{room_id}/action", post(rooms::take_action));

    let host_routes = Router::new()
        .route("/rooms/{room_id}/host/collect", post(host::collect_bets))
        .route("/rooms/{room_id}/host/distribute", post(host::distribute_pot))
        .route("/rooms/{room_id}/host/advance", post(host::advance_stage))
        .route("/rooms/{room_id}/host/new-round", post(host::new_round))
        .route("/rooms/{room_id}/host/dealer", post(host::set_dealer))
        .route("/rooms/{room_id}/host/move-button", post(host::move_button))
        .route("/rooms/{room_id}/host/status", post(host::set_status))
        .route("/rooms/{room_id}/host/start-round", post(host::start_round));

    let protected_routes = Router::new()
        .merge(player_routes)
        .merge(host_routes)
        .layer(axum::middleware::from_fn(middleware::identity_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when storage answers, `503 Service Unavailable` otherwise.
/// The in-memory backend is always healthy.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, healthy) = match &state.database {
        Some(db) => ("postgres", db.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
