//! Host-only endpoints.
//!
//! The controller checks the caller against the room's stored host, so
//! these handlers only translate requests and record what happened.

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use poker_room::{
    RoomResult,
    game::{Chips, GameStatus, PlayerId, Seat},
};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::{ApiResult, AppState, middleware::PlayerKey, reject};
use crate::{logging, metrics};

#[derive(Debug, Deserialize, Serialize)]
pub struct DistributeRequest {
    pub winner_id: PlayerId,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DealerRequest {
    pub seat: Seat,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StatusRequest {
    pub status: GameStatus,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChipsResponse {
    pub amount: Chips,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StageResponse {
    pub status: GameStatus,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SeatResponse {
    /// `None` when nobody is seated
    pub seat: Option<Seat>,
}

/// Count, log and wrap the outcome of a host operation.
fn finish<T: Debug>(
    room_id: &str,
    caller: &PlayerKey,
    operation: &str,
    result: RoomResult<T>,
) -> Result<T, super::ApiError> {
    let value = result.map_err(|e| reject(room_id, Some(caller.as_str()), operation, e))?;
    metrics::host_actions_total(operation);
    logging::log_host_action(room_id, operation, &format!("{value:?}"));
    Ok(value)
}

/// `POST /rooms/{room_id}/host/collect`
pub async fn collect_bets(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
) -> ApiResult<ChipsResponse> {
    let result = state.controller.collect_bets(&room_id, caller.as_str()).await;
    let amount = finish(&room_id, &caller, "collect", result)?;
    Ok(Json(ChipsResponse { amount }))
}

/// `POST /rooms/{room_id}/host/distribute`
pub async fn distribute_pot(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
    Json(request): Json<DistributeRequest>,
) -> ApiResult<ChipsResponse> {
    let result = state
        .controller
        .distribute_pot(&room_id, caller.as_str(), &request.winner_id)
        .await;
    let amount = finish(&room_id, &caller, "distribute", result)?;
    metrics::pot_size_chips(amount);
    Ok(Json(ChipsResponse { amount }))
}

/// `POST /rooms/{room_id}/host/advance`
pub async fn advance_stage(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
) -> ApiResult<StageResponse> {
    let result = state.controller.advance_stage(&room_id, caller.as_str()).await;
    let status = finish(&room_id, &caller, "advance", result)?;
    Ok(Json(StageResponse { status }))
}

/// `POST /rooms/{room_id}/host/new-round`: returns the new dealer seat.
pub async fn new_round(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
) -> ApiResult<SeatResponse> {
    let result = state.controller.new_round(&room_id, caller.as_str()).await;
    let seat = finish(&room_id, &caller, "new_round", result)?;
    Ok(Json(SeatResponse { seat }))
}

/// `POST /rooms/{room_id}/host/dealer`
pub async fn set_dealer(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
    Json(request): Json<DealerRequest>,
) -> ApiResult<SeatResponse> {
    let result = state
        .controller
        .set_dealer(&room_id, caller.as_str(), request.seat)
        .await;
    finish(&room_id, &caller, "set_dealer", result)?;
    Ok(Json(SeatResponse {
        seat: Some(request.seat),
    }))
}

/// `POST /rooms/{room_id}/host/move-button`
pub async fn move_button(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
) -> ApiResult<SeatResponse> {
    let result = state.controller.move_button(&room_id, caller.as_str()).await;
    let seat = finish(&room_id, &caller, "move_button", result)?;
    Ok(Json(SeatResponse { seat }))
}

/// `POST /rooms/{room_id}/host/status`
pub async fn set_status(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<StageResponse> {
    let result = state
        .controller
        .set_game_status(&room_id, caller.as_str(), request.status)
        .await;
    finish(&room_id, &caller, "set_status", result)?;
    Ok(Json(StageResponse {
        status: request.status,
    }))
}

/// `POST /rooms/{room_id}/host/start-round`: returns the first seat to act.
pub async fn start_round(
    State(state): State<AppState>,
    Extension(caller): Extension<PlayerKey>,
    Path(room_id): Path<String>,
) -> ApiResult<SeatResponse> {
    let result = state
        .controller
        .start_betting_round(&room_id, caller.as_str())
        .await;
    let seat = finish(&room_id, &caller, "start_round", result)?;
    Ok(Json(SeatResponse { seat }))
}
