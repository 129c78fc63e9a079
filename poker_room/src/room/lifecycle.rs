//! Host-only pot and stage operations.
//!
//! Each operation checks the caller against the persisted `host_id` inside
//! the room's transaction before touching anything.

use super::{
    controller::RoomController,
    errors::{RoomError, RoomResult},
};
use crate::game::{ActionError, Chips, GameStatus, RoomSnapshot, Seat, engine};

fn require_host(snap: &RoomSnapshot, caller: &str) -> RoomResult<()> {
    if !snap.room.is_host(caller) {
        log::warn!("Room {}: {} attempted a host action", snap.room.room_id, caller);
        return Err(RoomError::NotHost);
    }
    Ok(())
}

/// Sweep outstanding bets into the pot, then open a round at the current
/// stage. Returns the first seat to act.
fn sweep_and_open(snap: &mut RoomSnapshot) -> Option<Seat> {
    let RoomSnapshot { room, players } = snap;
    engine::collect_bets(room, players);
    engine::start_round(room, players)
}

impl RoomController {
    /// Sweep every current bet into the pot. Returns the amount collected.
    pub async fn collect_bets(&self, room_id: &str, caller: &str) -> RoomResult<Chips> {
        let (change, collected) = self
            .mutate_room(room_id, |snap| {
                require_host(snap, caller)?;
                if engine::outstanding_bets(&snap.players) == 0 {
                    return Err(RoomError::NothingToCollect);
                }
                let RoomSnapshot { room, players } = snap;
                Ok(engine::collect_bets(room, players))
            })
            .await?;

        log::info!(
            "Room {}: collected {} into pot {}",
            room_id,
            collected,
            change.after.room.pot
        );
        Ok(collected)
    }

    /// Award the whole pot to `winner_id`. Returns the amount paid.
    pub async fn distribute_pot(
        &self,
        room_id: &str,
        caller: &str,
        winner_id: &str,
    ) -> RoomResult<Chips> {
        let (_, pot) = self
            .mutate_room(room_id, |snap| {
                require_host(snap, caller)?;
                let pot = snap.room.pot;
                if pot <= 0 {
                    return Err(RoomError::EmptyPot);
                }
                let winner = snap
                    .player_mut(winner_id)
                    .ok_or_else(|| RoomError::PlayerNotFound(winner_id.to_string()))?;
                if !winner.is_seated() {
                    return Err(ActionError::NotSeated.into());
                }
                if winner.is_folded {
                    return Err(RoomError::WinnerFolded);
                }

                winner.balance += pot;
                winner.touch();
                snap.room.pot = 0;
                Ok(pot)
            })
            .await?;

        log::info!("Room {}: {} won {}", room_id, winner_id, pot);
        Ok(pot)
    }

    /// Move to the next stage. Outstanding bets are swept into the pot, and
    /// entering a street opens a fresh betting round.
    pub async fn advance_stage(&self, room_id: &str, caller: &str) -> RoomResult<GameStatus> {
        let (change, status) = self
            .mutate_room(room_id, |snap| {
                require_host(snap, caller)?;
                snap.room.status = snap.room.status.next();
                if snap.room.status.is_betting_stage() {
                    sweep_and_open(snap);
                } else {
                    let RoomSnapshot { room, players } = &mut *snap;
                    engine::collect_bets(room, players);
                    room.current_turn_seat = None;
                    room.current_highest_bet = 0;
                }
                Ok(snap.room.status)
            })
            .await?;

        log::info!(
            "Room {}: stage {} -> {}",
            room_id,
            change.before.room.status,
            status
        );
        Ok(status)
    }

    /// Back to waiting with the dealer button moved one seat clockwise.
    pub async fn new_round(&self, room_id: &str, caller: &str) -> RoomResult<Option<Seat>> {
        let (_, dealer) = self
            .mutate_room(room_id, |snap| {
                require_host(snap, caller)?;
                let room = &mut snap.room;
                room.status = GameStatus::Waiting;
                room.dealer_seat = engine::next_dealer(room, &snap.players).or(room.dealer_seat);
                room.current_turn_seat = None;
                room.current_highest_bet = 0;
                room.betting_round_complete = false;
                Ok(room.dealer_seat)
            })
            .await?;

        log::info!("Room {}: new round, dealer at {:?}", room_id, dealer);
        Ok(dealer)
    }

    pub async fn set_dealer(&self, room_id: &str, caller: &str, seat: Seat) -> RoomResult<()> {
        if usize::from(seat) >= self.config.max_seats {
            return Err(RoomError::InvalidSeat(format!(
                "seat {} is outside 0..{}",
                seat, self.config.max_seats
            )));
        }
        self.mutate_room(room_id, |snap| {
            require_host(snap, caller)?;
            snap.room.dealer_seat = Some(seat);
            Ok(())
        })
        .await?;
        Ok(())
    }

    /// Move the button to the next occupied seat clockwise. With nobody
    /// seated the button stays where it is.
    pub async fn move_button(&self, room_id: &str, caller: &str) -> RoomResult<Option<Seat>> {
        let (_, dealer) = self
            .mutate_room(room_id, |snap| {
                require_host(snap, caller)?;
                if let Some(next) = engine::next_dealer(&snap.room, &snap.players) {
                    snap.room.dealer_seat = Some(next);
                }
                Ok(snap.room.dealer_seat)
            })
            .await?;

        log::debug!("Room {}: button at seat {:?}", room_id, dealer);
        Ok(dealer)
    }

    /// Overwrite the stage without side effects.
    pub async fn set_game_status(
        &self,
        room_id: &str,
        caller: &str,
        status: GameStatus,
    ) -> RoomResult<()> {
        self.mutate_room(room_id, |snap| {
            require_host(snap, caller)?;
            snap.room.status = status;
            Ok(())
        })
        .await?;
        Ok(())
    }

    /// Open a betting round at the current stage, sweeping any bets left
    /// over from an earlier round into the pot first. Returns the first seat
    /// to act, or `None` when nobody is seated.
    pub async fn start_betting_round(
        &self,
        room_id: &str,
        caller: &str,
    ) -> RoomResult<Option<Seat>> {
        let (_, first) = self
            .mutate_room(room_id, |snap| {
                require_host(snap, caller)?;
                Ok(sweep_and_open(snap))
            })
            .await?;

        match first {
            Some(seat) => log::info!("Room {}: betting round opened on seat {}", room_id, seat),
            None => log::warn!("Room {}: no seated players, round not opened", room_id),
        }
        Ok(first)
    }
}
