//! # System Sync
//!
//! Authoritative engine for a two-player, turn-based card game played over a
//! real-time session.
//!
//! The crate owns the match state machine (mandatory draw, a single discard
//! per turn, special-card effects, sequence laying, win detection) and the
//! room layer that binds two connections to the seats of a match, serializes
//! every action against it and broadcasts the result. Broadcasts carry the
//! whole match except right after a steal, when the stolen cards are masked
//! for everyone but the thief.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, turn state machine, effects, per-viewer projection
//! - [`room`]: Room actors and the room registry
//! - [`net`]: Wire protocol and per-connection sessions
//!
//! ## Example
//!
//! ```
//! use rand::{SeedableRng, rngs::StdRng};
//! use system_sync::{GameMode, Match, PlayOptions};
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let mut game = Match::start(GameMode::Standard, &mut rng);
//! game.play_card(0, 0, PlayOptions::None, &mut rng).unwrap();
//! game.end_turn(0).unwrap();
//! assert!(game.is_conserved());
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    ClientView, GameMode, Match, MatchEvent, PlayOptions, UserError,
    constants::{self, DECK_SIZE, MAX_PLAYERS},
    entities::{self, Card, Rank, Slot, Suit},
    functional,
};

/// Rooms and the room registry.
pub mod room;
pub use room::{ConnectionId, RoomError, RoomManager};

/// Wire protocol and sessions.
pub mod net;
pub use net::{messages, session::Session, utils};
