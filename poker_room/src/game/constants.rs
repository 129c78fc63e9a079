/// Seats around the table; valid seat indices are `0..MAX_SEATS`.
pub const MAX_SEATS: usize = 9;

/// Length of a generated room code.
pub const ROOM_CODE_LEN: usize = 6;

/// Alphabet room codes are drawn from.
pub const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Prefix of generated player identities.
pub const PLAYER_ID_PREFIX: &str = "player_";

/// Random suffix length of generated player identities.
pub const PLAYER_ID_SUFFIX_LEN: usize = 9;

pub const DEFAULT_MIN_BUY_IN: i64 = 1;
pub const DEFAULT_MAX_BUY_IN: i64 = 1_000_000;

/// Display name given to the host's unseated row.
pub const HOST_NAME: &str = "Host";

pub const HOST_AVATAR: &str = "👑";
