//! HTTP API client for the poker room server.

use anyhow::{Context, Result};
use poker_room::{
    game::{Action, Chips, GameStatus, NewPlayer, Player, RoomSnapshot, Seat},
    room::{ActionReport, RoomCheck},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

/// API client acting for one player id
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    player_id: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: String, player_id: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            player_id,
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// WebSocket URL for a room's change feed
    pub fn websocket_url(&self, room_id: &str) -> String {
        let ws_url = self
            .base_url
            .replace("http://", "ws://")
            .replace("https://", "wss://");
        format!("{}/ws/{}?player_id={}", ws_url, room_id, self.player_id)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}/api/v1{}", self.base_url, path))
            .header("x-player-id", &self.player_id)
            .send()
            .await
            .with_context(|| format!("Failed to send {what} request"))?;
        Self::read(response, what).await
    }

    async fn post<T, B>(&self, path: &str, body: Option<&B>, what: &str) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self
            .client
            .post(format!("{}/api/v1{}", self.base_url, path))
            .header("x-player-id", &self.player_id);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {what} request"))?;
        Self::read(response, what).await
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = match response.json::<Value>().await {
                Ok(body) => body["error"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.to_string()),
                Err(_) => status.to_string(),
            };
            anyhow::bail!("{} failed: {}", what, error_text);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {what} response"))
    }

    // ========================================================================
    // Rooms
    // ========================================================================

    /// Create a room hosted by this player
    pub async fn create_room(&self) -> Result<RoomSnapshot> {
        self.post::<_, Value>("/rooms", None, "Create room").await
    }

    pub async fn snapshot(&self, room_id: &str) -> Result<RoomSnapshot> {
        self.get(&format!("/rooms/{room_id}"), "Snapshot").await
    }

    pub async fn check_room(&self, room_id: &str) -> Result<RoomCheck> {
        self.get(&format!("/rooms/{room_id}/check"), "Room check").await
    }

    pub async fn join_room(&self, room_id: &str, request: &NewPlayer) -> Result<Player> {
        self.post(&format!("/rooms/{room_id}/join"), Some(request), "Join")
            .await
    }

    pub async fn resume(&self, room_id: &str) -> Result<Player> {
        self.post::<_, Value>(&format!("/rooms/{room_id}/resume"), None, "Resume")
            .await
    }

    // ========================================================================
    // Betting
    // ========================================================================

    pub async fn stage(&self, room_id: &str, amount: Chips, velocity: Option<f64>) -> Result<Player> {
        let body = json!({ "amount": amount, "velocity": velocity });
        self.post(&format!("/rooms/{room_id}/stage"), Some(&body), "Stage")
            .await
    }

    pub async fn clear(&self, room_id: &str) -> Result<Player> {
        self.post::<_, Value>(&format!("/rooms/{room_id}/clear"), None, "Clear")
            .await
    }

    pub async fn confirm(&self, room_id: &str) -> Result<ActionReport> {
        self.post::<_, Value>(&format!("/rooms/{room_id}/confirm"), None, "Confirm")
            .await
    }

    pub async fn act(&self, room_id: &str, action: Action) -> Result<ActionReport> {
        let body = json!({ "action": action });
        self.post(&format!("/rooms/{room_id}/action"), Some(&body), "Action")
            .await
    }

    // ========================================================================
    // Host controls
    // ========================================================================

    /// Call a host endpoint; the response is returned as raw JSON
    pub async fn host(&self, room_id: &str, route: &str, body: Option<Value>) -> Result<Value> {
        self.post(
            &format!("/rooms/{room_id}/host/{route}"),
            body.as_ref(),
            route,
        )
        .await
    }

    pub async fn set_dealer(&self, room_id: &str, seat: Seat) -> Result<Value> {
        self.host(room_id, "dealer", Some(json!({ "seat": seat })))
            .await
    }

    pub async fn set_status(&self, room_id: &str, status: GameStatus) -> Result<Value> {
        self.host(room_id, "status", Some(json!({ "status": status })))
            .await
    }

    pub async fn distribute(&self, room_id: &str, winner_id: &str) -> Result<Value> {
        self.host(room_id, "distribute", Some(json!({ "winner_id": winner_id })))
            .await
    }
}
