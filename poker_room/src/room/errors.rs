//! Room controller error types.

use thiserror::Error;

use crate::game::{ActionError, Chips, Seat};

/// Room errors
#[derive(Debug, Error)]
pub enum RoomError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Room {0} not found")]
    RoomNotFound(String),

    #[error("Room {0} already exists")]
    RoomExists(String),

    #[error("Player {0} not found in room")]
    PlayerNotFound(String),

    #[error("Seat {0} is already taken")]
    SeatTaken(Seat),

    #[error("Invalid seat: {0}")]
    InvalidSeat(String),

    #[error("Invalid buy-in {amount}: must be between {min} and {max}")]
    InvalidBuyIn { amount: Chips, min: Chips, max: Chips },

    #[error("Invalid stage amount: {0}")]
    InvalidStageAmount(Chips),

    #[error("Only the host can do that")]
    NotHost,

    #[error("It is not your turn")]
    NotYourTurn,

    #[error("No betting round in progress")]
    NoActiveRound,

    /// Engine declined the action
    #[error(transparent)]
    Rejected(#[from] ActionError),

    #[error("Nothing to collect")]
    NothingToCollect,

    #[error("Pot is empty")]
    EmptyPot,

    #[error("Winner has folded")]
    WinnerFolded,

    #[error("Could not allocate a room code after {0} attempts")]
    CodeSpaceExhausted(usize),
}

impl RoomError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            RoomError::Database(_) => "Internal server error".to_string(),
            RoomError::PlayerNotFound(_) => "Player not found in room".to_string(),
            RoomError::CodeSpaceExhausted(_) => "Could not create room, try again".to_string(),
            _ => self.to_string(),
        }
    }

    /// Declined by validation rather than an I/O failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            RoomError::Database(_) | RoomError::CodeSpaceExhausted(_)
        )
    }
}

/// Result type for room operations
pub type RoomResult<T> = Result<T, RoomError>;
