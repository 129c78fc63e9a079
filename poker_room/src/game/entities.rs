use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::errors::{ActionError, ActionResult};

/// Room identifier (six-character join code).
pub type RoomId = String;

/// Stable per-device player identifier.
pub type PlayerId = String;

/// Seat position around the table, below `constants::MAX_SEATS`.
pub type Seat = u8;

/// Chip amounts. Signed so SQL `BIGINT` columns map directly.
pub type Chips = i64;

/// Stages of a hand, cycled by the host.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    #[default]
    Waiting,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl GameStatus {
    pub const ALL: [GameStatus; 6] = [
        Self::Waiting,
        Self::PreFlop,
        Self::Flop,
        Self::Turn,
        Self::River,
        Self::Showdown,
    ];

    /// The stage that follows this one, wrapping from showdown back to waiting.
    pub fn next(self) -> Self {
        match self {
            Self::Waiting => Self::PreFlop,
            Self::PreFlop => Self::Flop,
            Self::Flop => Self::Turn,
            Self::Turn => Self::River,
            Self::River => Self::Showdown,
            Self::Showdown => Self::Waiting,
        }
    }

    /// Whether entering this stage opens a betting round.
    pub fn is_betting_stage(self) -> bool {
        !matches!(self, Self::Waiting | Self::Showdown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown game status '{s}'"))
    }
}

/// Last action label shown next to a seat.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerAction {
    #[default]
    None,
    Check,
    Call,
    Bet,
    Raise,
    Fold,
}

impl PlayerAction {
    /// Column value; `None` is stored as SQL `NULL`.
    pub fn as_db(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Check => Some("check"),
            Self::Call => Some("call"),
            Self::Bet => Some("bet"),
            Self::Raise => Some("raise"),
            Self::Fold => Some("fold"),
        }
    }

    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some("check") => Self::Check,
            Some("call") => Self::Call,
            Some("bet") => Self::Bet,
            Some("raise") => Self::Raise,
            Some("fold") => Self::Fold,
            _ => Self::None,
        }
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::None => "waiting",
            Self::Check => "checks",
            Self::Call => "calls",
            Self::Bet => "bets",
            Self::Raise => "raises",
            Self::Fold => "folds",
        };
        write!(f, "{repr}")
    }
}

/// A betting decision submitted by the player whose turn it is.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "amount", rename_all = "snake_case")]
pub enum Action {
    Fold,
    Check,
    Call,
    /// Bet or raise so the player's total commitment this round is `amount`.
    BetRaise(Chips),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "fold"),
            Self::Check => write!(f, "check"),
            Self::Call => write!(f, "call"),
            Self::BetRaise(amount) => write!(f, "bet/raise to {amount}"),
        }
    }
}

/// One player's ledger row within a room.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub name: String,
    pub avatar: String,
    pub color: Option<String>,
    pub is_host: bool,
    /// `None` for the host and any other unseated member.
    pub seat: Option<Seat>,
    pub balance: Chips,
    pub current_bet: Chips,
    pub staged_bet: Chips,
    pub is_folded: bool,
    pub has_acted_this_round: bool,
    pub last_action: PlayerAction,
    pub last_seen: DateTime<Utc>,
}

impl Player {
    pub fn is_seated(&self) -> bool {
        self.seat.is_some()
    }

    /// Seated and still in the hand.
    pub fn is_active(&self) -> bool {
        self.is_seated() && !self.is_folded
    }

    /// Everything the player holds across the three buckets.
    pub fn chips_held(&self) -> Chips {
        self.balance + self.current_bet + self.staged_bet
    }

    /// Funds available for a betting action; staged chips count as available.
    pub fn available(&self) -> Chips {
        self.balance + self.staged_bet
    }

    /// Move staged chips back into the balance.
    pub fn release_staged(&mut self) {
        self.balance += self.staged_bet;
        self.staged_bet = 0;
    }

    /// Set the staged amount to `total`, drawing from balance plus whatever
    /// was staged before.
    pub fn stage(&mut self, total: Chips) -> ActionResult<()> {
        if total < 0 {
            return Err(ActionError::InvalidAmount(total));
        }
        if !self.is_seated() {
            return Err(ActionError::NotSeated);
        }
        if self.is_folded {
            return Err(ActionError::AlreadyFolded);
        }
        if total > self.available() {
            return Err(ActionError::InsufficientBalance {
                available: self.available(),
                required: total,
            });
        }

        self.release_staged();
        self.balance -= total;
        self.staged_bet = total;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }
}

/// Per-room shared state. Host owned, apart from the turn pointer which the
/// controller advances after every action.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoomState {
    pub room_id: RoomId,
    pub host_id: PlayerId,
    pub status: GameStatus,
    pub pot: Chips,
    pub dealer_seat: Option<Seat>,
    pub current_turn_seat: Option<Seat>,
    pub current_highest_bet: Chips,
    pub betting_round_complete: bool,
    pub created_at: DateTime<Utc>,
}

impl RoomState {
    /// Zeroed state for a freshly created room.
    pub fn new(room_id: RoomId, host_id: PlayerId) -> Self {
        Self {
            room_id,
            host_id,
            status: GameStatus::Waiting,
            pot: 0,
            dealer_seat: None,
            current_turn_seat: None,
            current_highest_bet: 0,
            betting_round_complete: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.host_id == player_id
    }
}

/// Join request details supplied by a player.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewPlayer {
    pub name: String,
    pub avatar: String,
    pub seat: Seat,
    pub buy_in: Chips,
    pub color: Option<String>,
}

impl NewPlayer {
    pub fn into_player(self, room_id: &str, player_id: &str) -> Player {
        Player {
            room_id: room_id.to_string(),
            player_id: player_id.to_string(),
            name: self.name,
            avatar: self.avatar,
            color: self.color,
            is_host: false,
            seat: Some(self.seat),
            balance: self.buy_in,
            current_bet: 0,
            staged_bet: 0,
            is_folded: false,
            has_acted_this_round: false,
            last_action: PlayerAction::None,
            last_seen: Utc::now(),
        }
    }
}

/// Room row plus every member row, read together before a decision.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RoomSnapshot {
    pub room: RoomState,
    pub players: Vec<Player>,
}

impl RoomSnapshot {
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    pub fn occupied_seats(&self) -> Vec<Seat> {
        let mut seats: Vec<Seat> = self.players.iter().filter_map(|p| p.seat).collect();
        seats.sort_unstable();
        seats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_status_cycles_through_every_stage() {
        let mut status = GameStatus::Waiting;
        let mut seen = Vec::new();
        for _ in 0..GameStatus::ALL.len() {
            seen.push(status);
            status = status.next();
        }
        assert_eq!(seen, GameStatus::ALL);
        assert_eq!(status, GameStatus::Waiting);
    }

    #[test]
    fn only_street_stages_open_betting() {
        assert!(!GameStatus::Waiting.is_betting_stage());
        assert!(GameStatus::PreFlop.is_betting_stage());
        assert!(GameStatus::River.is_betting_stage());
        assert!(!GameStatus::Showdown.is_betting_stage());
    }

    #[test]
    fn game_status_parses_its_own_labels() {
        for status in GameStatus::ALL {
            assert_eq!(status.as_str().parse::<GameStatus>(), Ok(status));
        }
        assert!("preflop".parse::<GameStatus>().is_err());
    }

    #[test]
    fn game_status_serializes_as_kebab_case() {
        let json = serde_json::to_string(&GameStatus::PreFlop).unwrap();
        assert_eq!(json, "\"pre-flop\"");
    }

    #[test]
    fn player_action_db_mapping() {
        assert_eq!(PlayerAction::None.as_db(), None);
        assert_eq!(PlayerAction::from_db(None), PlayerAction::None);
        assert_eq!(PlayerAction::from_db(Some("raise")), PlayerAction::Raise);
        assert_eq!(PlayerAction::from_db(Some("bogus")), PlayerAction::None);
    }

    #[test]
    fn action_json_shape() {
        let raise: Action = serde_json::from_str(r#"{"type":"bet_raise","amount":100}"#).unwrap();
        assert_eq!(raise, Action::BetRaise(100));
        let fold: Action = serde_json::from_str(r#"{"type":"fold"}"#).unwrap();
        assert_eq!(fold, Action::Fold);
    }

    #[test]
    fn releasing_staged_chips_keeps_holdings() {
        let mut player = NewPlayer {
            name: "alice".to_string(),
            avatar: "A".to_string(),
            seat: 3,
            buy_in: 500,
            color: None,
        }
        .into_player("ROOM01", "player_a");
        player.balance = 400;
        player.staged_bet = 100;
        let before = player.chips_held();

        player.release_staged();

        assert_eq!(player.balance, 500);
        assert_eq!(player.staged_bet, 0);
        assert_eq!(player.chips_held(), before);
    }

    #[test]
    fn staging_moves_chips_between_buckets() {
        let mut player = NewPlayer {
            name: "bob".to_string(),
            avatar: "B".to_string(),
            seat: 2,
            buy_in: 300,
            color: None,
        }
        .into_player("ROOM01", "player_b");
        player.current_bet = 50;

        player.stage(120).unwrap();
        assert_eq!((player.balance, player.staged_bet, player.current_bet), (180, 120, 50));

        // Restaging replaces the previous amount rather than adding to it.
        player.stage(40).unwrap();
        assert_eq!((player.balance, player.staged_bet), (260, 40));

        assert_eq!(
            player.stage(301),
            Err(ActionError::InsufficientBalance {
                available: 300,
                required: 301
            })
        );
        assert_eq!(player.stage(-1), Err(ActionError::InvalidAmount(-1)));
        assert_eq!(player.chips_held(), 350);
    }

    #[test]
    fn folded_or_unseated_players_cannot_stage() {
        let mut player = NewPlayer {
            name: "bob".to_string(),
            avatar: "B".to_string(),
            seat: 2,
            buy_in: 300,
            color: None,
        }
        .into_player("ROOM01", "player_b");
        player.is_folded = true;
        assert_eq!(player.stage(10), Err(ActionError::AlreadyFolded));

        player.seat = None;
        assert_eq!(player.stage(10), Err(ActionError::NotSeated));
    }
}
