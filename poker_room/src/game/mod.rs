//! Betting-round core: table entities, validation errors and the pure
//! turn/round engine.

pub mod constants;
pub mod engine;
pub mod entities;
pub mod errors;

pub use engine::{ActionOutcome, TurnDecision};
pub use entities::{
    Action, Chips, GameStatus, NewPlayer, Player, PlayerAction, PlayerId, RoomId, RoomSnapshot,
    RoomState, Seat,
};
pub use errors::{ActionError, ActionResult};
