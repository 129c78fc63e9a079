//! In-process implementation of [`RoomRepository`].
//!
//! Used by the test suites and by the server's `memory` storage backend.
//! Every operation holds the lock for its whole duration, so
//! [`RoomRepository::transact`] is as isolated here as a locked database
//! transaction.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::repository::{RoomChange, RoomMutation, RoomRepository};
use crate::game::{Player, PlayerId, RoomId, RoomSnapshot, RoomState, Seat};
use crate::room::{RoomError, RoomResult};

#[derive(Default)]
struct Tables {
    rooms: HashMap<RoomId, RoomState>,
    players: HashMap<(RoomId, PlayerId), Player>,
}

impl Tables {
    fn seat_holder(&self, player: &Player) -> Option<&Player> {
        let seat = player.seat?;
        self.players.values().find(|other| {
            other.room_id == player.room_id
                && other.player_id != player.player_id
                && other.seat == Some(seat)
        })
    }

    fn members(&self, room_id: &str) -> Vec<Player> {
        let mut players: Vec<Player> = self
            .players
            .values()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect();
        players.sort_by(|a, b| (a.seat, &a.player_id).cmp(&(b.seat, &b.player_id)));
        players
    }
}

/// First seat held by two members of the same room.
fn double_booked(players: &[Player]) -> Option<Seat> {
    let mut seats: Vec<Seat> = players.iter().filter_map(|p| p.seat).collect();
    seats.sort_unstable();
    seats.windows(2).find(|pair| pair[0] == pair[1]).map(|pair| pair[0])
}

#[derive(Default)]
pub struct InMemoryRoomRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(room_id: &str, player_id: &str) -> (RoomId, PlayerId) {
    (room_id.to_string(), player_id.to_string())
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn insert_room(&self, room: &RoomState) -> RoomResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.rooms.contains_key(&room.room_id) {
            return Err(RoomError::RoomExists(room.room_id.clone()));
        }
        tables.rooms.insert(room.room_id.clone(), room.clone());
        Ok(())
    }

    async fn find_room(&self, room_id: &str) -> RoomResult<Option<RoomState>> {
        Ok(self.tables.lock().await.rooms.get(room_id).cloned())
    }

    async fn list_players(&self, room_id: &str) -> RoomResult<Vec<Player>> {
        Ok(self.tables.lock().await.members(room_id))
    }

    async fn upsert_player(&self, player: &Player) -> RoomResult<()> {
        let mut tables = self.tables.lock().await;
        if !tables.rooms.contains_key(&player.room_id) {
            return Err(RoomError::RoomNotFound(player.room_id.clone()));
        }
        if let (Some(seat), Some(_)) = (player.seat, tables.seat_holder(player)) {
            return Err(RoomError::SeatTaken(seat));
        }
        tables
            .players
            .insert(key(&player.room_id, &player.player_id), player.clone());
        Ok(())
    }

    async fn transact(
        &self,
        room_id: &str,
        mutate: &mut RoomMutation<'_>,
    ) -> RoomResult<RoomChange> {
        let mut tables = self.tables.lock().await;
        let room = tables
            .rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;
        let before = RoomSnapshot {
            room,
            players: tables.members(room_id),
        };

        let mut after = before.clone();
        mutate(&mut after)?;
        if let Some(seat) = double_booked(&after.players) {
            return Err(RoomError::SeatTaken(seat));
        }
        let change = RoomChange { before, after };

        for (_, player) in change.changed_players() {
            tables
                .players
                .insert(key(&player.room_id, &player.player_id), player.clone());
        }
        if change.room_changed() {
            tables
                .rooms
                .insert(room_id.to_string(), change.after.room.clone());
        }
        Ok(change)
    }
}
