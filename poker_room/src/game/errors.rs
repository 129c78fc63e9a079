//! Betting validation errors.

use thiserror::Error;

use super::entities::Chips;

/// Reasons the engine declines an action. A declined action leaves every
/// row untouched and does not advance the turn.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ActionError {
    #[error("Player {0} is not in this room")]
    UnknownPlayer(String),

    #[error("Player is not seated")]
    NotSeated,

    #[error("Player has already folded")]
    AlreadyFolded,

    #[error("Cannot check while owing {owed}")]
    IllegalCheck { owed: Chips },

    #[error("Nothing to call")]
    NothingToCall,

    #[error("Bet of {amount} does not exceed current bet {current_bet}")]
    NotAnIncrease { amount: Chips, current_bet: Chips },

    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Chips, required: Chips },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Chips),
}

pub type ActionResult<T> = Result<T, ActionError>;
