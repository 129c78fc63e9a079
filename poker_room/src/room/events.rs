//! Change feed and animation hints.
//!
//! Every persisted mutation is published as a [`RoomEvent`] carrying the old
//! and new row. Gesture hints travel on the same channel but are never
//! persisted, and a subscriber that lags simply misses them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::{RwLock, broadcast};

use crate::game::{Chips, Player, PlayerId, RoomId, RoomState};

/// What a chip animation depicts.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HintKind {
    /// Chips dragged into the staging area
    Stage,
    /// Committed chips flying from the stage to the bet
    Bet,
}

/// Ephemeral animation cue.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BetHint {
    pub kind: HintKind,
    pub player_id: PlayerId,
    pub amount: Chips,
    /// Gesture speed reported by the client, used only to pace the animation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl BetHint {
    pub fn stage(player_id: &str, amount: Chips, velocity: Option<f64>) -> Self {
        Self {
            kind: HintKind::Stage,
            player_id: player_id.to_string(),
            amount,
            velocity,
            timestamp: Utc::now(),
        }
    }
}

/// Messages delivered to room subscribers.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoomEvent {
    PlayerChanged {
        old: Option<Player>,
        new: Player,
    },
    RoomChanged {
        old: Option<RoomState>,
        new: RoomState,
    },
    StageAnimation {
        hint: BetHint,
    },
}

impl RoomEvent {
    /// A "bet" animation cue when this update grew a player's current bet.
    pub fn bet_increase(&self) -> Option<BetHint> {
        let Self::PlayerChanged { old: Some(old), new } = self else {
            return None;
        };
        let diff = new.current_bet - old.current_bet;
        (diff > 0).then(|| BetHint {
            kind: HintKind::Bet,
            player_id: new.player_id.clone(),
            amount: diff,
            velocity: None,
            timestamp: Utc::now(),
        })
    }
}

/// Per-room broadcast channels.
pub struct RoomHub {
    capacity: usize,
    channels: RwLock<HashMap<RoomId, broadcast::Sender<RoomEvent>>>,
}

impl RoomHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Receive every event published for `room_id` from now on.
    pub async fn subscribe(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        if let Some(sender) = self.channels.read().await.get(room_id) {
            return sender.subscribe();
        }

        let mut channels = self.channels.write().await;
        channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Fan out an event. Returns how many subscribers received it; rooms
    /// nobody is watching just drop it.
    pub async fn publish(&self, room_id: &str, event: RoomEvent) -> usize {
        let channels = self.channels.read().await;
        match channels.get(room_id) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Forget channels whose subscribers have all gone away.
    pub async fn prune(&self) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|_, sender| sender.receiver_count() > 0);
        before - channels.len()
    }

    /// Live receivers on the room's channel.
    pub async fn subscriber_count(&self, room_id: &str) -> usize {
        self.channels
            .read()
            .await
            .get(room_id)
            .map_or(0, |sender| sender.receiver_count())
    }
}
