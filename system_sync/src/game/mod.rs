//! Card game engine: deck model, turn state machine, special effects and the
//! per-viewer projection used for broadcasts.

pub mod constants;
pub mod effects;
pub mod entities;
pub mod functional;
pub mod state_machine;
pub mod views;

pub use state_machine::{
    GameMode, Match, MatchEvent, PlayOptions, TurnContext, TurnPhase, UserError, opponent,
};
pub use views::{CardView, ClientView, Concealment, PlayerView, project};
