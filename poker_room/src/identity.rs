//! Per-device player identity.
//!
//! A player id is generated once and stored in a small file, so the same
//! device resumes the same seat (or host role) after a restart.

use rand::Rng;
use std::{fs, io, path::Path};

use crate::game::{
    PlayerId,
    constants::{PLAYER_ID_PREFIX, PLAYER_ID_SUFFIX_LEN},
};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerIdentity {
    pub player_id: PlayerId,
}

impl PlayerIdentity {
    /// Fresh random identity: `player_` followed by nine base-36 characters.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..PLAYER_ID_SUFFIX_LEN)
            .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
            .collect();
        Self {
            player_id: format!("{PLAYER_ID_PREFIX}{suffix}"),
        }
    }

    /// Read the identity stored at `path`, or generate and store one.
    ///
    /// A missing, empty or malformed file is replaced.
    pub fn load_or_create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => {
                let stored = contents.trim();
                if Self::is_valid(stored) {
                    return Ok(Self {
                        player_id: stored.to_string(),
                    });
                }
                log::warn!("Ignoring malformed identity in {}", path.display());
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }

        let identity = Self::generate();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &identity.player_id)?;
        log::info!("Created player identity {}", identity.player_id);
        Ok(identity)
    }

    pub fn is_valid(candidate: &str) -> bool {
        candidate
            .strip_prefix(PLAYER_ID_PREFIX)
            .is_some_and(|suffix| {
                !suffix.is_empty() && suffix.bytes().all(|b| BASE36.contains(&b))
            })
    }
}
