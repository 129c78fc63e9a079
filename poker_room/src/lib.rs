//! # Poker Room
//!
//! Shared-table betting rounds for a poker room whose cards are dealt by
//! hand. A host screen shows seats, pot and chip animations; players stage
//! and confirm bets and fold, check, call or raise in turn.
//!
//! ## Core Modules
//!
//! - [`game`]: entities and the pure betting-round engine
//! - [`room`]: controller, host lifecycle, change feed, staged-bet view
//! - [`db`]: PostgreSQL pool, repository trait and implementations
//! - [`identity`]: per-device player id

pub mod db;
pub mod game;
pub mod identity;
pub mod room;

pub use db::{Database, DatabaseConfig, InMemoryRoomRepository, PgRoomRepository, RoomRepository};
pub use game::{Action, GameStatus, NewPlayer, Player, RoomSnapshot, RoomState};
pub use identity::PlayerIdentity;
pub use room::{RoomConfig, RoomController, RoomError, RoomEvent, RoomResult};
