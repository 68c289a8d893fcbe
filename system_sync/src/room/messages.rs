//! Room actor message types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::game::{
    ClientView, GameMode, PlayOptions, UserError,
    entities::{CardId, Slot},
};
use crate::net::messages::ServerMessage;

/// Short code clients use to address a room.
pub type RoomCode = String;

/// Queue of messages bound for one connection.
pub type Outbox = mpsc::Sender<ServerMessage>;

/// Process-unique identity of one client connection.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session-level rejections. Match rule violations are wrapped unchanged.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RoomError {
    #[error("room not found")]
    RoomNotFound,
    #[error("room full")]
    RoomFull,
    #[error("only the host can start the game")]
    NotHost,
    #[error("need 2 players to start")]
    NotEnoughPlayers,
    #[error("not in room")]
    NotInRoom,
    #[error("room is closed")]
    RoomClosed,
    #[error("invalid room config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    User(#[from] UserError),
}

impl RoomError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound => "RoomNotFound",
            Self::RoomFull => "RoomFull",
            Self::NotHost => "NotHost",
            Self::NotEnoughPlayers => "NotEnoughPlayers",
            Self::NotInRoom => "NotInRoom",
            Self::RoomClosed => "RoomClosed",
            Self::InvalidConfig(_) => "InvalidConfig",
            Self::User(error) => error.code(),
        }
    }
}

pub type RoomResult<T> = Result<T, RoomError>;

/// In-match actions relayed from a connection.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchCommand {
    /// `player_index` is what the client claims; it must equal its slot.
    PlayCard {
        player_index: Slot,
        hand_index: usize,
        options: PlayOptions,
    },
    EndTurn,
    LaySequence {
        player_index: Slot,
        hand_indices: Vec<usize>,
    },
    ReorderTop {
        new_order_ids: Vec<CardId>,
    },
    SortHand,
    DrawUpToFour,
}

impl MatchCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayCard { .. } => "playCard",
            Self::EndTurn => "endTurn",
            Self::LaySequence { .. } => "laySequence",
            Self::ReorderTop { .. } => "reorderTop",
            Self::SortHand => "sortHand",
            Self::DrawUpToFour => "drawUpToFour",
        }
    }
}

/// Successful outcome of a [`MatchCommand`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CommandReply {
    /// Cards drawn by `drawUpToFour`.
    pub drawn: Option<usize>,
    /// This command won the match.
    pub finished: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct JoinAccepted {
    pub player_index: Slot,
    pub mode: GameMode,
    pub sequences_to_win: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LeaveOutcome {
    pub player_index: Slot,
    /// Connections still bound after the leave. Zero means the room stopped.
    pub remaining: usize,
}

/// Messages that can be sent to a RoomActor
#[derive(Debug)]
pub enum RoomMessage {
    /// Bind a connection to the lowest free slot
    Join {
        connection: ConnectionId,
        outbox: Outbox,
        response: oneshot::Sender<RoomResult<JoinAccepted>>,
    },

    /// Unbind a connection (explicit leave or disconnect)
    Leave {
        connection: ConnectionId,
        response: oneshot::Sender<RoomResult<LeaveOutcome>>,
    },

    /// Deal a fresh match (host only)
    StartGame {
        connection: ConnectionId,
        response: oneshot::Sender<RoomResult<()>>,
    },

    /// In-match action
    Command {
        connection: ConnectionId,
        command: MatchCommand,
        response: oneshot::Sender<RoomResult<CommandReply>>,
    },

    /// Full snapshot of the current match
    GetState {
        connection: ConnectionId,
        response: oneshot::Sender<RoomResult<ClientView>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_taxonomy_names() {
        assert_eq!(RoomError::RoomFull.code(), "RoomFull");
        assert_eq!(RoomError::from(UserError::NotAuthorized).code(), "NotAuthorized");
        assert_eq!(
            RoomError::from(UserError::MustDiscardFirst).to_string(),
            "you must discard one card before ending your turn"
        );
    }

    #[test]
    fn test_connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }
}
