//! Betting-round state machine.
//!
//! Every function here is pure over a snapshot: it mutates the in-memory
//! [`RoomState`] and [`Player`] rows it is handed and reports what changed,
//! leaving persistence to the caller. Seats are visited clockwise, which is
//! ascending seat index with wrap-around.

use serde::{Deserialize, Serialize};

use super::{
    entities::{Action, Chips, Player, PlayerAction, PlayerId, RoomState, Seat},
    errors::{ActionError, ActionResult},
};

/// What [`apply_action`] did to the acting player and the room.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub player_id: PlayerId,
    pub action: PlayerAction,
    /// Chips moved from the player's balance into their current bet.
    pub deducted: Chips,
    /// Highest bet before the action.
    pub previous_highest_bet: Chips,
    /// Other players whose acted flag was cleared by a raise.
    pub reopened: Vec<PlayerId>,
}

/// Result of [`advance_turn`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "decision", content = "detail", rename_all = "snake_case")]
pub enum TurnDecision {
    /// Everyone else folded; the remaining player wins by default.
    SoleSurvivor { player_id: PlayerId, seat: Seat },
    /// Every active player has acted and matched the highest bet.
    RoundComplete,
    /// Action passes to this seat.
    Next(Seat),
    /// No seated, unfolded player left. Nothing was changed.
    NoActivePlayers,
}

/// Sorted seats of all seated players, folded or not.
pub fn occupied_seats(players: &[Player]) -> Vec<Seat> {
    let mut seats: Vec<Seat> = players.iter().filter_map(|p| p.seat).collect();
    seats.sort_unstable();
    seats.dedup();
    seats
}

/// Seated, unfolded players ordered by seat.
pub fn active_players(players: &[Player]) -> Vec<&Player> {
    let mut active: Vec<&Player> = players.iter().filter(|p| p.is_active()).collect();
    active.sort_by_key(|p| p.seat);
    active
}

/// First seat strictly clockwise of `from`, wrapping to the lowest seat.
/// `seats` must be sorted ascending.
pub fn next_seat_clockwise(seats: &[Seat], from: Seat) -> Option<Seat> {
    seats
        .iter()
        .copied()
        .find(|&seat| seat > from)
        .or_else(|| seats.first().copied())
}

/// Reset every seated player for a new betting round and hand the turn to
/// the first seat clockwise of the dealer (or the lowest seat if no dealer
/// is set).
///
/// Returns the seat that acts first, or `None` without touching anything
/// when no seat is occupied.
pub fn start_round(room: &mut RoomState, players: &mut [Player]) -> Option<Seat> {
    let seats = occupied_seats(players);
    let first = match room.dealer_seat {
        Some(dealer) => next_seat_clockwise(&seats, dealer),
        None => seats.first().copied(),
    }?;

    for player in players.iter_mut().filter(|p| p.is_seated()) {
        player.is_folded = false;
        player.has_acted_this_round = false;
        player.last_action = PlayerAction::None;
    }

    room.current_highest_bet = 0;
    room.betting_round_complete = false;
    room.current_turn_seat = Some(first);

    Some(first)
}

/// Validate and apply one betting action.
///
/// Turn ownership is the caller's concern; this only checks that the action
/// is legal for the player's ledger and the room's highest bet. Staged chips
/// count as available funds and are always returned to the balance before
/// the action settles.
pub fn apply_action(
    room: &mut RoomState,
    players: &mut [Player],
    player_id: &str,
    action: Action,
) -> ActionResult<ActionOutcome> {
    let idx = players
        .iter()
        .position(|p| p.player_id == player_id)
        .ok_or_else(|| ActionError::UnknownPlayer(player_id.to_string()))?;

    let player = &players[idx];
    if !player.is_seated() {
        return Err(ActionError::NotSeated);
    }
    if player.is_folded {
        return Err(ActionError::AlreadyFolded);
    }

    let highest = room.current_highest_bet;
    let (label, new_bet) = match action {
        Action::Fold => (PlayerAction::Fold, player.current_bet),
        Action::Check => {
            if highest != 0 && player.current_bet != highest {
                return Err(ActionError::IllegalCheck {
                    owed: highest - player.current_bet,
                });
            }
            (PlayerAction::Check, player.current_bet)
        }
        Action::Call => {
            let required = highest - player.current_bet;
            if required <= 0 {
                return Err(ActionError::NothingToCall);
            }
            ensure_funds(player, required)?;
            (PlayerAction::Call, highest)
        }
        Action::BetRaise(amount) => {
            if amount <= 0 {
                return Err(ActionError::InvalidAmount(amount));
            }
            let required = amount - player.current_bet;
            if required <= 0 {
                return Err(ActionError::NotAnIncrease {
                    amount,
                    current_bet: player.current_bet,
                });
            }
            ensure_funds(player, required)?;
            let label = if highest > 0 {
                PlayerAction::Raise
            } else {
                PlayerAction::Bet
            };
            (label, amount)
        }
    };

    let player = &mut players[idx];
    let deducted = new_bet - player.current_bet;
    player.release_staged();
    player.balance -= deducted;
    player.current_bet = new_bet;
    player.has_acted_this_round = true;
    player.last_action = label;
    if label == PlayerAction::Fold {
        player.is_folded = true;
    }
    player.touch();

    // Only a bet or raise moves the highest bet and reopens action; a check
    // or fold over a stale bet must not.
    let mut reopened = Vec::new();
    if matches!(action, Action::BetRaise(_)) && new_bet > highest {
        room.current_highest_bet = new_bet;
        for other in players.iter_mut() {
            if other.player_id != player_id && other.is_active() && other.has_acted_this_round {
                other.has_acted_this_round = false;
                reopened.push(other.player_id.clone());
            }
        }
    }

    Ok(ActionOutcome {
        player_id: player_id.to_string(),
        action: label,
        deducted,
        previous_highest_bet: highest,
        reopened,
    })
}

fn ensure_funds(player: &Player, required: Chips) -> ActionResult<()> {
    if player.available() < required {
        return Err(ActionError::InsufficientBalance {
            available: player.available(),
            required,
        });
    }
    Ok(())
}

/// Decide what happens after an action: finish the round or pass the turn.
///
/// Updates `current_turn_seat` and `betting_round_complete` on `room`. Moving
/// the stage to showdown on [`TurnDecision::SoleSurvivor`] is left to the
/// caller.
pub fn advance_turn(room: &mut RoomState, players: &[Player]) -> TurnDecision {
    let active = active_players(players);

    let Some(first) = active.first() else {
        return TurnDecision::NoActivePlayers;
    };

    if active.len() == 1 {
        room.betting_round_complete = true;
        room.current_turn_seat = None;
        return TurnDecision::SoleSurvivor {
            player_id: first.player_id.clone(),
            seat: first.seat.unwrap_or_default(),
        };
    }

    if is_round_complete(room.current_highest_bet, &active) {
        room.betting_round_complete = true;
        room.current_turn_seat = None;
        return TurnDecision::RoundComplete;
    }

    let seats: Vec<Seat> = active.iter().filter_map(|p| p.seat).collect();
    let next = match room.current_turn_seat {
        Some(current) => next_seat_clockwise(&seats, current),
        None => seats.first().copied(),
    }
    .unwrap_or_default();

    room.betting_round_complete = false;
    room.current_turn_seat = Some(next);
    TurnDecision::Next(next)
}

/// All active players have acted and matched `highest_bet`.
pub fn is_round_complete(highest_bet: Chips, active: &[&Player]) -> bool {
    active
        .iter()
        .all(|p| p.has_acted_this_round && p.current_bet == highest_bet)
}

/// Sum of every member's current bet.
pub fn outstanding_bets(players: &[Player]) -> Chips {
    players.iter().map(|p| p.current_bet).sum()
}

/// Move every current bet into the pot. Returns the amount moved.
pub fn collect_bets(room: &mut RoomState, players: &mut [Player]) -> Chips {
    let total = outstanding_bets(players);
    for player in players.iter_mut().filter(|p| p.current_bet != 0) {
        player.current_bet = 0;
        player.touch();
    }
    room.pot += total;
    total
}

/// The dealer button's next position: the next occupied seat clockwise, or
/// the lowest occupied seat when no dealer is set.
pub fn next_dealer(room: &RoomState, players: &[Player]) -> Option<Seat> {
    let seats = occupied_seats(players);
    match room.dealer_seat {
        Some(dealer) => next_seat_clockwise(&seats, dealer),
        None => seats.first().copied(),
    }
}
