//! Repository trait for room and player rows, with the PostgreSQL
//! implementation.
//!
//! The controller only talks to [`RoomRepository`], so tests run the same
//! code paths against [`InMemoryRoomRepository`](super::InMemoryRoomRepository).

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool, Row, postgres::PgRow};

use crate::game::{GameStatus, Player, PlayerAction, RoomSnapshot, RoomState, Seat};
use crate::room::{RoomError, RoomResult};

/// A read-modify-write over one room's rows, run while the room is locked.
///
/// The mutation may edit the room row and any member row, or push new
/// members. It must not change row keys or remove members. Returning an
/// error aborts the transaction with nothing written.
pub type RoomMutation<'a> = dyn FnMut(&mut RoomSnapshot) -> RoomResult<()> + Send + 'a;

/// Rows of a room as they were before and after a [`RoomRepository::transact`].
#[derive(Clone, Debug)]
pub struct RoomChange {
    pub before: RoomSnapshot,
    pub after: RoomSnapshot,
}

impl RoomChange {
    /// Member rows the mutation inserted or modified, with their prior state.
    pub fn changed_players(&self) -> impl Iterator<Item = (Option<&Player>, &Player)> {
        self.after.players.iter().filter_map(|player| {
            let old = self.before.player(&player.player_id);
            (old != Some(player)).then_some((old, player))
        })
    }

    pub fn room_changed(&self) -> bool {
        self.before.room != self.after.room
    }

    pub fn is_empty(&self) -> bool {
        !self.room_changed() && self.changed_players().next().is_none()
    }
}

/// Storage operations for rooms and their members
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Insert a new room. Fails with [`RoomError::RoomExists`] on a code clash.
    async fn insert_room(&self, room: &RoomState) -> RoomResult<()>;

    /// Find room by code
    async fn find_room(&self, room_id: &str) -> RoomResult<Option<RoomState>>;

    /// Every member of a room, unseated members first, then by seat
    async fn list_players(&self, room_id: &str) -> RoomResult<Vec<Player>>;

    /// Insert or replace a member keyed by (room, player).
    /// Fails with [`RoomError::SeatTaken`] when another member holds the seat.
    async fn upsert_player(&self, player: &Player) -> RoomResult<()>;

    /// Lock the room, read it fresh, apply `mutate` and write every row that
    /// differs, all in one transaction. Concurrent transactions on the same
    /// room run one after the other.
    async fn transact(
        &self,
        room_id: &str,
        mutate: &mut RoomMutation<'_>,
    ) -> RoomResult<RoomChange>;

    /// Room plus all members, read fresh.
    async fn snapshot(&self, room_id: &str) -> RoomResult<RoomSnapshot> {
        let room = self
            .find_room(room_id)
            .await?
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;
        let players = self.list_players(room_id).await?;
        Ok(RoomSnapshot { room, players })
    }
}

/// PostgreSQL implementation of `RoomRepository`
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PLAYER_COLUMNS: &str = "room_id, user_id, name, avatar, color, is_host, seat_index, balance,
     current_bet, staged_bet, is_folded, has_acted_this_round, player_action, last_seen";

const ROOM_COLUMNS: &str = "id, host_id, game_status, pot, dealer_index, current_turn_seat_index,
     current_highest_bet, betting_round_complete, created_at";

fn seat_to_db(seat: Option<Seat>) -> i16 {
    seat.map_or(-1, i16::from)
}

fn seat_from_db(value: i16) -> Option<Seat> {
    Seat::try_from(value).ok()
}

fn room_from_row(row: &PgRow) -> RoomState {
    let status: String = row.get("game_status");
    RoomState {
        room_id: row.get("id"),
        host_id: row.get("host_id"),
        status: status.parse().unwrap_or_else(|err| {
            log::warn!("{err}, treating room as waiting");
            GameStatus::Waiting
        }),
        pot: row.get("pot"),
        dealer_seat: row
            .get::<Option<i16>, _>("dealer_index")
            .and_then(seat_from_db),
        current_turn_seat: seat_from_db(row.get("current_turn_seat_index")),
        current_highest_bet: row.get("current_highest_bet"),
        betting_round_complete: row.get("betting_round_complete"),
        created_at: row.get("created_at"),
    }
}

fn player_from_row(row: &PgRow) -> Player {
    Player {
        room_id: row.get("room_id"),
        player_id: row.get("user_id"),
        name: row.get("name"),
        avatar: row.get("avatar"),
        color: row.get("color"),
        is_host: row.get("is_host"),
        seat: seat_from_db(row.get("seat_index")),
        balance: row.get("balance"),
        current_bet: row.get("current_bet"),
        staged_bet: row.get("staged_bet"),
        is_folded: row.get("is_folded"),
        has_acted_this_round: row.get("has_acted_this_round"),
        last_action: PlayerAction::from_db(row.get::<Option<&str>, _>("player_action")),
        last_seen: row.get("last_seen"),
    }
}

async fn write_room<'e, E: PgExecutor<'e>>(executor: E, room: &RoomState) -> sqlx::Result<u64> {
    let result = sqlx::query(
        "UPDATE rooms
         SET host_id = $2, game_status = $3, pot = $4, dealer_index = $5,
             current_turn_seat_index = $6, current_highest_bet = $7,
             betting_round_complete = $8
         WHERE id = $1",
    )
    .bind(&room.room_id)
    .bind(&room.host_id)
    .bind(room.status.as_str())
    .bind(room.pot)
    .bind(room.dealer_seat.map(i16::from))
    .bind(seat_to_db(room.current_turn_seat))
    .bind(room.current_highest_bet)
    .bind(room.betting_round_complete)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Insert or overwrite a member row, mapping a seat clash to `SeatTaken`.
async fn write_player<'e, E: PgExecutor<'e>>(executor: E, player: &Player) -> RoomResult<()> {
    let result = sqlx::query(
        "INSERT INTO players (room_id, user_id, name, avatar, color, is_host, seat_index,
                              balance, current_bet, staged_bet, is_folded,
                              has_acted_this_round, player_action, last_seen)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         ON CONFLICT (room_id, user_id) DO UPDATE
         SET name = EXCLUDED.name, avatar = EXCLUDED.avatar, color = EXCLUDED.color,
             is_host = EXCLUDED.is_host, seat_index = EXCLUDED.seat_index,
             balance = EXCLUDED.balance, current_bet = EXCLUDED.current_bet,
             staged_bet = EXCLUDED.staged_bet, is_folded = EXCLUDED.is_folded,
             has_acted_this_round = EXCLUDED.has_acted_this_round,
             player_action = EXCLUDED.player_action, last_seen = EXCLUDED.last_seen",
    )
    .bind(&player.room_id)
    .bind(&player.player_id)
    .bind(&player.name)
    .bind(&player.avatar)
    .bind(&player.color)
    .bind(player.is_host)
    .bind(seat_to_db(player.seat))
    .bind(player.balance)
    .bind(player.current_bet)
    .bind(player.staged_bet)
    .bind(player.is_folded)
    .bind(player.has_acted_this_round)
    .bind(player.last_action.as_db())
    .bind(player.last_seen)
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => match player.seat {
            Some(seat) => Err(RoomError::SeatTaken(seat)),
            None => Err(err.into()),
        },
        Err(err) => Err(err.into()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn insert_room(&self, room: &RoomState) -> RoomResult<()> {
        let result = sqlx::query(
            "INSERT INTO rooms (id, host_id, game_status, pot, dealer_index,
                                current_turn_seat_index, current_highest_bet,
                                betting_round_complete, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&room.room_id)
        .bind(&room.host_id)
        .bind(room.status.as_str())
        .bind(room.pot)
        .bind(room.dealer_seat.map(i16::from))
        .bind(seat_to_db(room.current_turn_seat))
        .bind(room.current_highest_bet)
        .bind(room.betting_round_complete)
        .bind(room.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(RoomError::RoomExists(room.room_id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_room(&self, room_id: &str) -> RoomResult<Option<RoomState>> {
        let row = sqlx::query(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"))
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(room_from_row))
    }

    async fn list_players(&self, room_id: &str) -> RoomResult<Vec<Player>> {
        let rows = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE room_id = $1 ORDER BY seat_index, user_id"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(player_from_row).collect())
    }

    async fn upsert_player(&self, player: &Player) -> RoomResult<()> {
        write_player(&self.pool, player).await
    }

    async fn transact(
        &self,
        room_id: &str,
        mutate: &mut RoomMutation<'_>,
    ) -> RoomResult<RoomChange> {
        let mut tx = self.pool.begin().await?;

        // The room row lock serializes every writer of this room.
        let room = sqlx::query(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 FOR UPDATE"
        ))
        .bind(room_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;
        let players = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE room_id = $1 ORDER BY seat_index, user_id"
        ))
        .bind(room_id)
        .fetch_all(&mut *tx)
        .await?;

        let before = RoomSnapshot {
            room: room_from_row(&room),
            players: players.iter().map(player_from_row).collect(),
        };
        let mut after = before.clone();
        mutate(&mut after)?;
        let change = RoomChange { before, after };

        for (_, player) in change.changed_players() {
            write_player(&mut *tx, player).await?;
        }
        if change.room_changed() && write_room(&mut *tx, &change.after.room).await? == 0 {
            return Err(RoomError::RoomNotFound(room_id.to_string()));
        }

        tx.commit().await?;
        Ok(change)
    }
}
