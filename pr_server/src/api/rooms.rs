//! Room and player endpoints.
//!
//! All routes except `GET /rooms/{room_id}` sit behind the identity
//! middleware; the caller's [`PlayerKey`] is the player the request acts for.
//!
//! Stage then confirm a bet:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/rooms/ABC123/stage \
//!   -H "x-player-id: player_k3j9x0a1b" \
//!   -H "Content-Type: application/json" \
//!   -d '{"amount": 150, "velocity": 1.8}'
//! curl -X POST http://localhost:6969/api/v1/rooms/ABC123/confirm \
//!   -H "x-player-id: player_k3j9x0a1b"
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use poker_room::{
    game::{Action, Chips, NewPlayer, Player, RoomSnapshot},
    room::{ActionReport, RoomCheck},
};
use serde::{Deserialize, Serialize};

use super::{ApiResult, AppState, middleware::PlayerKey, reject, request_id::RequestId};
use crate::metrics;

#[derive(Debug, Deserialize, Serialize)]
pub struct StageRequest {
    /// New staged total, not an increment
    pub amount: Chips,
    /// Gesture speed; when present a stage animation is broadcast
    #[serde(default)]
    pub velocity: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ActionRequest {
    pub action: Action,
}

/// `GET /rooms/{room_id}`: room row plus every member.
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> ApiResult<RoomSnapshot> {
    state
        .controller
        .snapshot(&room_id)
        .await
        .map(Json)
        .map_err(|e| reject(&room_id, None, "snapshot", e))
}

/// `POST /rooms`: create a room hosted by the caller.
pub async fn create_room(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
) -> ApiResult<RoomSnapshot> {
    let snapshot = state
        .controller
        .create_room(caller.as_str())
        .await
        .map_err(|e| reject("-", Some(caller.as_str()), "create", e))?;

    metrics::rooms_created_total();
    tracing::info!(
        room_id = %snapshot.room.room_id,
        host_id = %caller.as_str(),
        "Room created"
    );
    Ok(Json(snapshot))
}

/// `GET /rooms/{room_id}/check`
pub async fn check_room(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
) -> ApiResult<RoomCheck> {
    state
        .controller
        .check_room(&room_id, caller.as_str())
        .await
        .map(Json)
        .map_err(|e| reject(&room_id, Some(caller.as_str()), "check", e))
}

/// `POST /rooms/{room_id}/join`
pub async fn join_room(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
    Json(request): Json<NewPlayer>,
) -> ApiResult<Player> {
    state
        .controller
        .join_room(&room_id, caller.as_str(), request)
        .await
        .map(Json)
        .map_err(|e| reject(&room_id, Some(caller.as_str()), "join", e))
}

/// `POST /rooms/{room_id}/resume`
pub async fn resume(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
) -> ApiResult<Player> {
    state
        .controller
        .resume(&room_id, caller.as_str())
        .await
        .map(Json)
        .map_err(|e| reject(&room_id, Some(caller.as_str()), "resume", e))
}

/// `POST /rooms/{room_id}/stage`
pub async fn stage_bet(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
    Json(request): Json<StageRequest>,
) -> ApiResult<Player> {
    state
        .controller
        .stage_bet(&room_id, caller.as_str(), request.amount, request.velocity)
        .await
        .map(Json)
        .map_err(|e| reject(&room_id, Some(caller.as_str()), "stage", e))
}

/// `POST /rooms/{room_id}/clear`
pub async fn clear_bet(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
) -> ApiResult<Player> {
    state
        .controller
        .clear_bet(&room_id, caller.as_str())
        .await
        .map(Json)
        .map_err(|e| reject(&room_id, Some(caller.as_str()), "clear", e))
}

/// `POST /rooms/{room_id}/confirm`: commit staged chips as a bet or raise.
pub async fn confirm_bet(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    request_id: RequestId,
    Path(room_id): Path<String>,
) -> ApiResult<ActionReport> {
    let report = state
        .controller
        .confirm_bet(&room_id, caller.as_str())
        .await
        .map_err(|e| reject(&room_id, Some(caller.as_str()), "confirm", e))?;

    record_action(&request_id, &room_id, &report);
    Ok(Json(report))
}

/// `POST /rooms/{room_id}/action`
///
/// Body is `{"action": {"type": "fold"}}` or
/// `{"action": {"type": "bet_raise", "amount": 200}}`.
pub async fn take_action(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    request_id: RequestId,
    Path(room_id): Path<String>,
    Json(request): Json<ActionRequest>,
) -> ApiResult<ActionReport> {
    let report = state
        .controller
        .act(&room_id, caller.as_str(), request.action)
        .await
        .map_err(|e| reject(&room_id, Some(caller.as_str()), "action", e))?;

    record_action(&request_id, &room_id, &report);
    Ok(Json(report))
}

fn record_action(request_id: &RequestId, room_id: &str, report: &ActionReport) {
    let label = report
        .outcome
        .action
        .as_db()
        .unwrap_or("none");
    metrics::player_actions_total(label);
    tracing::info!(
        request_id = %request_id.as_str(),
        room_id = room_id,
        player_id = %report.outcome.player_id,
        action = label,
        deducted = report.outcome.deducted,
        "Action applied"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_request_velocity_is_optional() {
        let request: StageRequest = serde_json::from_str(r#"{"amount": 40}"#).unwrap();
        assert_eq!(request.amount, 40);
        assert!(request.velocity.is_none());
    }

    #[test]
    fn test_action_request_shapes() {
        let fold: ActionRequest = serde_json::from_str(r#"{"action":{"type":"fold"}}"#).unwrap();
        assert_eq!(fold.action, Action::Fold);

        let raise: ActionRequest =
            serde_json::from_str(r#"{"action":{"type":"bet_raise","amount":200}}"#).unwrap();
        assert_eq!(raise.action, Action::BetRaise(200));
    }
}
