//! Room controller, host lifecycle and change feed.
//!
//! ## Example
//!
//! ```no_run
//! use poker_room::db::InMemoryRoomRepository;
//! use poker_room::game::NewPlayer;
//! use poker_room::room::{RoomConfig, RoomController};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = RoomController::new(
//!         Arc::new(InMemoryRoomRepository::new()),
//!         RoomConfig::default(),
//!     );
//!     let room = controller.create_room("player_host").await?.room;
//!
//!     let join = NewPlayer {
//!         name: "Alice".to_string(),
//!         avatar: "A".to_string(),
//!         seat: 0,
//!         buy_in: 1000,
//!         color: None,
//!     };
//!     controller.join_room(&room.room_id, "player_alice", join).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod errors;
pub mod events;
mod lifecycle;
pub mod reconcile;

pub use config::RoomConfig;
pub use controller::{ActionReport, RoomCheck, RoomController, generate_room_code};
pub use errors::{RoomError, RoomResult};
pub use events::{BetHint, HintKind, RoomEvent, RoomHub};
pub use reconcile::{StagedBets, merge_staged};
