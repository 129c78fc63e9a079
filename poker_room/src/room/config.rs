//! Room configuration.

use std::env;

use crate::game::{
    Chips,
    constants::{DEFAULT_MAX_BUY_IN, DEFAULT_MIN_BUY_IN, MAX_SEATS, ROOM_CODE_LEN},
};

/// Tunables shared by every room the controller manages.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Seats around the table
    pub max_seats: usize,

    /// Smallest accepted buy-in
    pub min_buy_in: Chips,

    /// Largest accepted buy-in
    pub max_buy_in: Chips,

    /// Length of generated room codes
    pub code_len: usize,

    /// Attempts at finding an unused room code before giving up
    pub code_attempts: usize,

    /// Buffered events per room before slow subscribers start lagging
    pub event_capacity: usize,
}

impl RoomConfig {
    /// Create configuration from environment variables
    ///
    /// - `ROOM_MIN_BUY_IN` (default: 1)
    /// - `ROOM_MAX_BUY_IN` (default: 1000000)
    /// - `ROOM_EVENT_CAPACITY` (default: 256)
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_buy_in: env_or("ROOM_MIN_BUY_IN", defaults.min_buy_in),
            max_buy_in: env_or("ROOM_MAX_BUY_IN", defaults.max_buy_in),
            event_capacity: env_or("ROOM_EVENT_CAPACITY", defaults.event_capacity),
            ..defaults
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_seats == 0 || self.max_seats > MAX_SEATS {
            return Err(format!("max_seats must be between 1 and {MAX_SEATS}"));
        }
        if self.min_buy_in <= 0 {
            return Err("min_buy_in must be positive".to_string());
        }
        if self.min_buy_in > self.max_buy_in {
            return Err("min_buy_in cannot exceed max_buy_in".to_string());
        }
        if self.code_len == 0 {
            return Err("code_len must be positive".to_string());
        }
        if self.code_attempts == 0 {
            return Err("code_attempts must be positive".to_string());
        }
        if self.event_capacity == 0 {
            return Err("event_capacity must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_seats: MAX_SEATS,
            min_buy_in: DEFAULT_MIN_BUY_IN,
            max_buy_in: DEFAULT_MAX_BUY_IN,
            code_len: ROOM_CODE_LEN,
            code_attempts: 8,
            event_capacity: 256,
        }
    }
}

fn env_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
