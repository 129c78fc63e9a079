//! Room controller: runs engine decisions against storage.
//!
//! Every operation locks the room, reads it fresh, computes the mutation in
//! memory and writes only the rows that changed, all in one storage
//! transaction. Each written row is then published on the room's channel.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{
    config::RoomConfig,
    errors::{RoomError, RoomResult},
    events::{BetHint, RoomEvent, RoomHub},
};
use crate::db::{RoomChange, RoomRepository};
use crate::game::{
    Action, ActionOutcome, Chips, GameStatus, NewPlayer, Player, PlayerAction, RoomSnapshot,
    RoomState, Seat, TurnDecision,
    constants::{HOST_AVATAR, HOST_NAME, ROOM_CODE_CHARSET},
    engine,
};

/// Answer to "can I join this room?", shown on join screens.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RoomCheck {
    pub exists: bool,
    pub is_member: bool,
    pub is_host: bool,
    pub player: Option<Player>,
    pub occupied_seats: Vec<Seat>,
    pub taken_names: Vec<String>,
}

/// Result of a player action after the turn has been advanced.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ActionReport {
    pub outcome: ActionOutcome,
    pub decision: TurnDecision,
    pub room: RoomState,
}

/// Random room code drawn from `A-Z0-9`.
pub fn generate_room_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(ROOM_CODE_CHARSET[rng.random_range(0..ROOM_CODE_CHARSET.len())]))
        .collect()
}

fn host_player(room_id: &str, host_id: &str) -> Player {
    Player {
        room_id: room_id.to_string(),
        player_id: host_id.to_string(),
        name: HOST_NAME.to_string(),
        avatar: HOST_AVATAR.to_string(),
        color: None,
        is_host: true,
        seat: None,
        balance: 0,
        current_bet: 0,
        staged_bet: 0,
        is_folded: false,
        has_acted_this_round: false,
        last_action: PlayerAction::None,
        last_seen: chrono::Utc::now(),
    }
}

pub struct RoomController {
    pub(super) repo: Arc<dyn RoomRepository>,
    pub(super) hub: Arc<RoomHub>,
    pub(super) config: RoomConfig,
}

impl RoomController {
    pub fn new(repo: Arc<dyn RoomRepository>, config: RoomConfig) -> Self {
        let hub = Arc::new(RoomHub::new(config.event_capacity));
        Self { repo, hub, config }
    }

    pub fn hub(&self) -> &Arc<RoomHub> {
        &self.hub
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Room plus all members.
    pub async fn snapshot(&self, room_id: &str) -> RoomResult<RoomSnapshot> {
        self.repo.snapshot(room_id).await
    }

    /// Create a room hosted by `host_id` under a fresh code.
    pub async fn create_room(&self, host_id: &str) -> RoomResult<RoomSnapshot> {
        for _ in 0..self.config.code_attempts {
            let code = generate_room_code(self.config.code_len);
            let room = RoomState::new(code.clone(), host_id.to_string());

            match self.repo.insert_room(&room).await {
                Ok(()) => {}
                Err(RoomError::RoomExists(_)) => {
                    log::debug!("Room code {} already in use, retrying", code);
                    continue;
                }
                Err(e) => return Err(e),
            }

            let host = host_player(&code, host_id);
            self.repo.upsert_player(&host).await?;
            log::info!("Created room {} hosted by {}", code, host_id);

            self.hub
                .publish(
                    &code,
                    RoomEvent::RoomChanged {
                        old: None,
                        new: room.clone(),
                    },
                )
                .await;
            self.publish_player(None, host.clone()).await;

            return Ok(RoomSnapshot {
                room,
                players: vec![host],
            });
        }

        Err(RoomError::CodeSpaceExhausted(self.config.code_attempts))
    }

    /// Whether `room_id` exists, whether the caller is in it, and which
    /// seats and names are taken. A missing room is not an error here.
    pub async fn check_room(&self, room_id: &str, player_id: &str) -> RoomResult<RoomCheck> {
        let Some(room) = self.repo.find_room(room_id).await? else {
            return Ok(RoomCheck::default());
        };
        let players = self.repo.list_players(room_id).await?;
        let snapshot = RoomSnapshot { room, players };
        let player = snapshot.player(player_id).cloned();

        Ok(RoomCheck {
            exists: true,
            is_member: player.is_some(),
            is_host: snapshot.room.is_host(player_id),
            player,
            occupied_seats: snapshot.occupied_seats(),
            taken_names: snapshot.players.iter().map(|p| p.name.clone()).collect(),
        })
    }

    /// Take a seat, or rejoin with an updated profile.
    ///
    /// The room's host is never demoted to a seated player; joining as the
    /// host resumes the host row instead. A returning member keeps their
    /// chips and the buy-in is ignored.
    pub async fn join_room(
        &self,
        room_id: &str,
        player_id: &str,
        join: NewPlayer,
    ) -> RoomResult<Player> {
        let seat = join.seat;
        let (_, player) = self
            .mutate_room(room_id, |snap| {
                if snap.room.is_host(player_id) {
                    return Ok(restore_host(snap));
                }

                self.validate_join(&join)?;
                if snap
                    .players
                    .iter()
                    .any(|p| p.seat == Some(seat) && p.player_id != player_id)
                {
                    return Err(RoomError::SeatTaken(seat));
                }

                match snap.player_mut(player_id) {
                    Some(current) => {
                        current.name = join.name.clone();
                        current.avatar = join.avatar.clone();
                        current.color = join.color.clone();
                        current.seat = Some(seat);
                        current.touch();
                        Ok(current.clone())
                    }
                    None => {
                        let player = join.clone().into_player(room_id, player_id);
                        snap.players.push(player.clone());
                        Ok(player)
                    }
                }
            })
            .await?;

        if player.is_host {
            log::info!("Host {} rejoined room {}", player_id, room_id);
        } else {
            log::info!(
                "Player {} ({}) sat at seat {} in room {}",
                player.player_id,
                player.name,
                seat,
                room_id
            );
        }
        Ok(player)
    }

    fn validate_join(&self, join: &NewPlayer) -> RoomResult<()> {
        if usize::from(join.seat) >= self.config.max_seats {
            return Err(RoomError::InvalidSeat(format!(
                "seat {} is outside 0..{}",
                join.seat, self.config.max_seats
            )));
        }
        if join.buy_in < self.config.min_buy_in || join.buy_in > self.config.max_buy_in {
            return Err(RoomError::InvalidBuyIn {
                amount: join.buy_in,
                min: self.config.min_buy_in,
                max: self.config.max_buy_in,
            });
        }
        Ok(())
    }

    /// Reconnect an existing member. Only `last_seen` changes, so nothing is
    /// published.
    pub async fn resume(&self, room_id: &str, player_id: &str) -> RoomResult<Player> {
        let (_, player) = self
            .transact(room_id, |snap| {
                let player = member_mut(snap, player_id)?;
                player.touch();
                Ok(player.clone())
            })
            .await?;

        log::debug!("Player {} resumed in room {}", player_id, room_id);
        Ok(player)
    }

    /// Set the caller's staged amount to `total`, moving chips between the
    /// balance and the staging area. A positive change with a gesture
    /// velocity is also broadcast as a stage animation.
    pub async fn stage_bet(
        &self,
        room_id: &str,
        player_id: &str,
        total: Chips,
        velocity: Option<f64>,
    ) -> RoomResult<Player> {
        if total < 0 {
            return Err(RoomError::InvalidStageAmount(total));
        }
        let (change, (previous, player)) = self
            .transact(room_id, |snap| {
                let player = member_mut(snap, player_id)?;
                let previous = player.staged_bet;
                player.stage(total)?;
                Ok((previous, player.clone()))
            })
            .await?;

        // The hint goes out ahead of the row so subscribers add the delta to
        // the old amount and the row then merges to the same total.
        let delta = total - previous;
        if delta > 0 && velocity.is_some() {
            self.publish_hint(room_id, BetHint::stage(player_id, delta, velocity))
                .await;
        }
        self.publish_change(&change).await;
        Ok(player)
    }

    /// Return staged chips to the balance.
    pub async fn clear_bet(&self, room_id: &str, player_id: &str) -> RoomResult<Player> {
        let (_, player) = self
            .mutate_room(room_id, |snap| {
                let player = member_mut(snap, player_id)?;
                if player.staged_bet != 0 {
                    player.release_staged();
                    player.touch();
                }
                Ok(player.clone())
            })
            .await?;
        Ok(player)
    }

    /// Commit the staged chips as a bet/raise to `current_bet + staged_bet`.
    pub async fn confirm_bet(&self, room_id: &str, player_id: &str) -> RoomResult<ActionReport> {
        self.act_with(room_id, player_id, |player| {
            if player.staged_bet <= 0 {
                return Err(RoomError::InvalidStageAmount(player.staged_bet));
            }
            Ok(Action::BetRaise(player.current_bet + player.staged_bet))
        })
        .await
    }

    pub async fn fold(&self, room_id: &str, player_id: &str) -> RoomResult<ActionReport> {
        self.act(room_id, player_id, Action::Fold).await
    }

    pub async fn check(&self, room_id: &str, player_id: &str) -> RoomResult<ActionReport> {
        self.act(room_id, player_id, Action::Check).await
    }

    pub async fn call(&self, room_id: &str, player_id: &str) -> RoomResult<ActionReport> {
        self.act(room_id, player_id, Action::Call).await
    }

    pub async fn bet_raise(
        &self,
        room_id: &str,
        player_id: &str,
        amount: Chips,
    ) -> RoomResult<ActionReport> {
        self.act(room_id, player_id, Action::BetRaise(amount)).await
    }

    /// Validate and apply a betting action by the turn holder, then pass
    /// the turn or close the round.
    pub async fn act(
        &self,
        room_id: &str,
        player_id: &str,
        action: Action,
    ) -> RoomResult<ActionReport> {
        self.act_with(room_id, player_id, |_| Ok(action)).await
    }

    /// Like [`act`](Self::act), with the action chosen from the caller's
    /// locked row.
    async fn act_with<F>(
        &self,
        room_id: &str,
        player_id: &str,
        choose: F,
    ) -> RoomResult<ActionReport>
    where
        F: Fn(&Player) -> RoomResult<Action> + Send + Sync,
    {
        let (change, (action, outcome)) = self
            .mutate_room(room_id, |snap| {
                let player = snap
                    .player(player_id)
                    .ok_or_else(|| RoomError::PlayerNotFound(player_id.to_string()))?;
                let action = choose(player)?;

                let Some(turn) = snap.room.current_turn_seat else {
                    log::warn!(
                        "Room {}: {} tried to {} with no round open",
                        room_id,
                        player_id,
                        action
                    );
                    return Err(RoomError::NoActiveRound);
                };
                if player.seat != Some(turn) {
                    log::warn!("Room {}: {} tried to {} out of turn", room_id, player_id, action);
                    return Err(RoomError::NotYourTurn);
                }

                let RoomSnapshot { room, players } = snap;
                let outcome = engine::apply_action(room, players, player_id, action)
                    .inspect_err(|e| {
                        log::warn!("Room {}: {} declined: {}", room_id, action, e);
                    })?;
                Ok((action, outcome))
            })
            .await?;

        log::info!(
            "Room {}: {} {} via {} (bet {} -> highest {})",
            room_id,
            player_id,
            outcome.action,
            action,
            outcome.deducted,
            change.after.room.current_highest_bet
        );

        let (decision, room) = self.advance_turn(room_id).await?;
        Ok(ActionReport {
            outcome,
            decision,
            room,
        })
    }

    /// Re-read the room and move the turn pointer; a sole survivor sends
    /// the room to showdown.
    async fn advance_turn(&self, room_id: &str) -> RoomResult<(TurnDecision, RoomState)> {
        let (change, decision) = self
            .mutate_room(room_id, |snap| {
                let decision = engine::advance_turn(&mut snap.room, &snap.players);
                if matches!(decision, TurnDecision::SoleSurvivor { .. }) {
                    snap.room.status = GameStatus::Showdown;
                }
                Ok(decision)
            })
            .await?;

        match &decision {
            TurnDecision::SoleSurvivor { player_id, .. } => {
                log::info!("Room {}: everyone else folded, {} remains", room_id, player_id);
            }
            TurnDecision::RoundComplete => {
                log::info!("Room {}: betting round complete", room_id);
            }
            TurnDecision::Next(seat) => {
                log::debug!("Room {}: action on seat {}", room_id, seat);
            }
            TurnDecision::NoActivePlayers => {
                log::warn!("Room {}: no active players to pass the turn to", room_id);
            }
        }
        Ok((decision, change.after.room))
    }

    /// Relay a client gesture to the room's subscribers.
    pub async fn publish_hint(&self, room_id: &str, hint: BetHint) -> usize {
        self.hub
            .publish(room_id, RoomEvent::StageAnimation { hint })
            .await
    }

    /// Run `mutate` against the locked room and return what it produced.
    /// Nothing is published.
    pub(super) async fn transact<T, F>(
        &self,
        room_id: &str,
        mut mutate: F,
    ) -> RoomResult<(RoomChange, T)>
    where
        T: Send,
        F: FnMut(&mut RoomSnapshot) -> RoomResult<T> + Send,
    {
        let mut output = None;
        let change = self
            .repo
            .transact(room_id, &mut |snap: &mut RoomSnapshot| -> RoomResult<()> {
                output = Some(mutate(snap)?);
                Ok(())
            })
            .await
            .inspect_err(|e| {
                if !e.is_rejection() {
                    log::error!("Room {}: failed to commit changes: {}", room_id, e);
                }
            })?;

        // A successful transaction always ran the mutation.
        let output = output.ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;
        Ok((change, output))
    }

    /// [`transact`](Self::transact), then publish every written row.
    pub(super) async fn mutate_room<T, F>(
        &self,
        room_id: &str,
        mutate: F,
    ) -> RoomResult<(RoomChange, T)>
    where
        T: Send,
        F: FnMut(&mut RoomSnapshot) -> RoomResult<T> + Send,
    {
        let (change, output) = self.transact(room_id, mutate).await?;
        self.publish_change(&change).await;
        Ok((change, output))
    }

    async fn publish_change(&self, change: &RoomChange) {
        for (old, new) in change.changed_players() {
            self.publish_player(old.cloned(), new.clone()).await;
        }
        if change.room_changed() {
            let room_id = &change.after.room.room_id;
            self.hub
                .publish(
                    room_id,
                    RoomEvent::RoomChanged {
                        old: Some(change.before.room.clone()),
                        new: change.after.room.clone(),
                    },
                )
                .await;
        }
    }

    async fn publish_player(&self, old: Option<Player>, new: Player) {
        let room_id = new.room_id.clone();
        self.hub
            .publish(&room_id, RoomEvent::PlayerChanged { old, new })
            .await;
    }
}

/// The caller's row inside a locked snapshot.
fn member_mut<'a>(snap: &'a mut RoomSnapshot, player_id: &str) -> RoomResult<&'a mut Player> {
    snap.player_mut(player_id)
        .ok_or_else(|| RoomError::PlayerNotFound(player_id.to_string()))
}

/// Bring back the host's unseated row, recreating it if it went missing.
fn restore_host(snap: &mut RoomSnapshot) -> Player {
    let host_id = snap.room.host_id.clone();
    match snap.player_mut(&host_id) {
        Some(host) => {
            host.is_host = true;
            host.touch();
            host.clone()
        }
        None => {
            let host = host_player(&snap.room.room_id, &host_id);
            snap.players.push(host.clone());
            host
        }
    }
}
