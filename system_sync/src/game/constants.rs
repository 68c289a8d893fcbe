//! Fixed rule parameters.

/// 13 ranks x 4 suits plus two jokers.
pub const DECK_SIZE: usize = 54;
pub const JOKER_COUNT: usize = 2;

/// Number of seats in a match.
pub const MAX_PLAYERS: usize = 2;

pub const STANDARD_HAND_SIZE: usize = 8;
pub const SUDDEN_DEATH_HAND_SIZE: usize = 3;

pub const STANDARD_SEQUENCES_TO_WIN: usize = 3;
pub const SUDDEN_DEATH_SEQUENCES_TO_WIN: usize = 1;

/// Cards drawn unconditionally when a turn starts.
pub const MANDATORY_DRAW: usize = 1;
/// Hand size the automatic top-up fills to.
pub const TOP_UP_TARGET: usize = 4;
/// `drawnThisTurnCount` once the top-up action has been used.
pub const TOPPED_UP_DRAW_COUNT: u8 = 2;

/// Extra cards drawn by an Ace (Boot).
pub const BOOT_DRAW_COUNT: usize = 2;
/// Cards taken from the opponent by a Jack (Hack).
pub const HACK_STEAL_COUNT: usize = 2;
/// Cards revealed by a Queen (Decrypt).
pub const DECRYPT_PEEK_DEPTH: usize = 3;

pub const MELD_SIZE: usize = 3;

pub const ROOM_CODE_LENGTH: usize = 6;
