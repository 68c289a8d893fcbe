//! Room configuration models.

use serde::{Deserialize, Serialize};

pub use crate::game::GameMode;

/// Default bound of a room actor's inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 64;

/// Per-room settings fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Starting hand size and win threshold
    pub mode: GameMode,

    /// Seed for the room's RNG; `None` draws from OS entropy
    pub seed: Option<u64>,

    /// Bound of the actor inbox
    pub inbox_capacity: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Standard,
            seed: None,
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
        }
    }
}

impl RoomConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.inbox_capacity == 0 {
            return Err("Inbox capacity must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn sequences_to_win(&self) -> usize {
        self.mode.sequences_to_win()
    }
}

/// Settings shared by every room a manager creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManagerSettings {
    /// Room `n` (counting from 0) is seeded with `base_seed + n`
    pub base_seed: Option<u64>,

    pub inbox_capacity: Option<usize>,
}

impl ManagerSettings {
    /// Config for the `index`-th room created by the manager.
    pub fn room_config(&self, mode: GameMode, index: u64) -> RoomConfig {
        RoomConfig {
            mode,
            seed: self.base_seed.map(|seed| seed.wrapping_add(index)),
            inbox_capacity: self.inbox_capacity.unwrap_or(DEFAULT_INBOX_CAPACITY),
        }
    }
}
