//! WebSocket change feed for a room.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/{room_id}?player_id=<id>`
//! 2. Server checks that the id belongs to a member of the room (the host
//!    counts) and upgrades the connection
//! 3. A send task forwards every `RoomEvent` published for the room,
//!    plus replies to the client's own messages
//! 4. The receive loop relays stage gestures to the other subscribers
//!
//! # Server Messages
//!
//! - Room events, tagged by `event`: `player_changed`, `room_changed`,
//!   `stage_animation`
//! - Replies, tagged by `type`: `success`, `error`, and `resync` when the
//!   connection fell behind and the client should reload the snapshot
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws/ABC123?player_id=player_k3j9x0a1b');
//! ws.send(JSON.stringify({ type: "stage_animation", amount: 25, velocity: 1.4 }));
//! ```

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use poker_room::{
    PlayerIdentity,
    game::Chips,
    room::BetHint,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast::error::RecvError;

use super::{AppState, rate_limiter::RateLimiter, status_for};
use crate::metrics;

static ACTIVE_CONNECTIONS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    player_id: String,
}

/// Client messages received via WebSocket
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Chips dragged toward the stage; relayed as an animation, never stored
    StageAnimation {
        amount: Chips,
        #[serde(default)]
        velocity: Option<f64>,
    },
}

/// Replies sent to the client
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerResponse {
    Success { message: String },
    Error { message: String },
    /// Events were dropped because this connection fell behind
    Resync { missed: u64 },
}

/// Upgrade to a WebSocket subscribed to `room_id`.
///
/// Returns `401 Unauthorized` for a malformed id, `404 Not Found` when the
/// room does not exist or the id is not a member.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    if !PlayerIdentity::is_valid(&query.player_id) {
        return (StatusCode::UNAUTHORIZED, "Invalid player id").into_response();
    }

    if let Err(e) = state.controller.resume(&room_id, &query.player_id).await {
        warn!(
            "WebSocket refused for {} in room {}: {}",
            query.player_id, room_id, e
        );
        return (status_for(&e), e.client_message()).into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, query.player_id, state))
}

async fn handle_socket(socket: WebSocket, room_id: String, player_id: String, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let active = ACTIVE_CONNECTIONS.fetch_add(1, Ordering::Relaxed) + 1;
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(active);
    info!("WebSocket connected: room={}, player={}", room_id, player_id);

    let mut events = state.controller.hub().subscribe(&room_id).await;
    debug!(
        "Room {} now has {} live subscribers",
        room_id,
        state.controller.hub().subscriber_count(&room_id).await
    );
    let (response_tx, mut response_rx) = tokio::sync::mpsc::channel::<String>(32);

    let feed_room = room_id.clone();
    let send_task = tokio::spawn(async move {
        loop {
            let outgoing = tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => serde_json::to_string(&event),
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Subscriber in room {} lagged by {} events", feed_room, missed);
                        serde_json::to_string(&ServerResponse::Resync { missed })
                    }
                    Err(RecvError::Closed) => break,
                },
                Some(response) = response_rx.recv() => Ok(response),
            };

            let json = match outgoing {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize room event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            metrics::websocket_messages_sent();
        }
    });

    let mut limiter = RateLimiter::for_gestures();

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();

                let response = match limiter.check() {
                    Err(limited) => {
                        warn!(
                            "Gesture rate limit hit by {} in room {}",
                            player_id, room_id
                        );
                        metrics::rate_limit_hits_total("websocket");
                        ServerResponse::Error {
                            message: limited.message().to_string(),
                        }
                    }
                    Ok(()) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => handle_client_message(message, &room_id, &player_id, &state).await,
                        Err(e) => {
                            warn!("Failed to parse client message: {}", e);
                            ServerResponse::Error {
                                message: "Invalid message format".to_string(),
                            }
                        }
                    },
                };

                if let Ok(json) = serde_json::to_string(&response)
                    && response_tx.send(json).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: room={}, player={}", room_id, player_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    // The aborted task still owns the room receiver until it has unwound.
    let _ = send_task.await;

    let active = ACTIVE_CONNECTIONS.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
    metrics::websocket_connections_active(active);
    let pruned = state.controller.hub().prune().await;
    if pruned > 0 {
        debug!("Pruned {} idle room channels", pruned);
    }

    info!("WebSocket disconnected: room={}, player={}", room_id, player_id);
}

async fn handle_client_message(
    message: ClientMessage,
    room_id: &str,
    player_id: &str,
    state: &AppState,
) -> ServerResponse {
    match message {
        ClientMessage::StageAnimation { amount, velocity } => {
            if amount <= 0 {
                return ServerResponse::Error {
                    message: format!("Invalid stage amount: {amount}"),
                };
            }
            let delivered = state
                .controller
                .publish_hint(room_id, BetHint::stage(player_id, amount, velocity))
                .await;
            ServerResponse::Success {
                message: format!("Relayed to {delivered} subscribers"),
            }
        }
    }
}
