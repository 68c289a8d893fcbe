use serde::{Deserialize, Serialize};
use std::fmt;

use super::super::game::{
    ClientView, GameMode, PlayOptions,
    entities::{Card, CardId, Slot},
};
use super::super::room::messages::{ConnectionId, RoomCode, RoomError};

/// A request from a client. `id` is echoed in the acknowledgment so the
/// client can pair them.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClientEnvelope {
    #[serde(default)]
    pub id: u64,
    #[serde(flatten)]
    pub action: ClientAction,
}

/// Every action a client may request.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientAction {
    CreateRoom {
        #[serde(default)]
        mode: GameMode,
    },
    JoinRoom {
        room_id: RoomCode,
    },
    StartGame {
        room_id: RoomCode,
    },
    PlayCard {
        room_id: RoomCode,
        player_index: Slot,
        hand_index: usize,
        #[serde(default)]
        options: PlayOptions,
    },
    EndTurn {
        room_id: RoomCode,
    },
    LaySequence {
        room_id: RoomCode,
        player_index: Slot,
        hand_indices: Vec<usize>,
    },
    ReorderTop {
        room_id: RoomCode,
        new_order_ids: Vec<CardId>,
    },
    SortHand {
        room_id: RoomCode,
    },
    DrawUpToFour {
        room_id: RoomCode,
    },
    GetState {
        room_id: RoomCode,
    },
    LeaveRoom {
        room_id: RoomCode,
    },
}

impl ClientAction {
    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "createRoom",
            Self::JoinRoom { .. } => "joinRoom",
            Self::StartGame { .. } => "startGame",
            Self::PlayCard { .. } => "playCard",
            Self::EndTurn { .. } => "endTurn",
            Self::LaySequence { .. } => "laySequence",
            Self::ReorderTop { .. } => "reorderTop",
            Self::SortHand { .. } => "sortHand",
            Self::DrawUpToFour { .. } => "drawUpToFour",
            Self::GetState { .. } => "getState",
            Self::LeaveRoom { .. } => "leaveRoom",
        }
    }

    /// The room an action targets; `None` only for room creation.
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Self::CreateRoom { .. } => None,
            Self::JoinRoom { room_id }
            | Self::StartGame { room_id }
            | Self::PlayCard { room_id, .. }
            | Self::EndTurn { room_id }
            | Self::LaySequence { room_id, .. }
            | Self::ReorderTop { room_id, .. }
            | Self::SortHand { room_id }
            | Self::DrawUpToFour { room_id }
            | Self::GetState { room_id }
            | Self::LeaveRoom { room_id } => Some(room_id),
        }
    }
}

impl fmt::Display for ClientAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.room_id() {
            Some(room) => write!(f, "{} in {room}", self.name()),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// Turn bookkeeping sent alongside every state update.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMeta {
    pub mode: GameMode,
    pub sequences_to_win: usize,
    pub drawn_this_turn_count: u8,
    pub discarded_this_turn_for: Option<Slot>,
}

/// Action-specific fields merged into a successful acknowledgment.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum AckData {
    RoomCreated {
        room_id: RoomCode,
        player_index: Slot,
    },
    RoomJoined {
        player_index: Slot,
        mode: GameMode,
        sequences_to_win: usize,
    },
    Drawn {
        drawn: usize,
    },
    State {
        state: ClientView,
    },
}

/// Everything the server sends: acknowledgments and room broadcasts.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Ack {
        id: u64,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(flatten)]
        data: Option<AckData>,
    },
    GameStarted {
        state: ClientView,
    },
    StateUpdate {
        state: ClientView,
        meta: StateMeta,
    },
    CardsDrawn {
        player_index: Slot,
        count: usize,
        new_hand_size: usize,
    },
    CardsStolen {
        player_index: Slot,
        count: usize,
    },
    ExtraTurnGranted {
        player_index: Slot,
        remaining: u32,
    },
    /// Only ever sent to the seat that played the Queen.
    PeekTop {
        top3: Vec<Card>,
    },
    GameOver {
        winner: Slot,
    },
    PlayerJoined {
        connection_id: ConnectionId,
        player_index: Slot,
    },
    PlayerLeft {
        connection_id: ConnectionId,
        player_index: Slot,
    },
}

impl ServerMessage {
    pub fn ack(id: u64, data: Option<AckData>) -> Self {
        Self::Ack {
            id,
            ok: true,
            reason: None,
            code: None,
            data,
        }
    }

    pub fn nack(id: u64, code: &str, reason: impl Into<String>) -> Self {
        Self::Ack {
            id,
            ok: false,
            reason: Some(reason.into()),
            code: Some(code.to_string()),
            data: None,
        }
    }

    pub fn rejected(id: u64, error: &RoomError) -> Self {
        Self::nack(id, error.code(), error.to_string())
    }

    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ack { .. } => "ack",
            Self::GameStarted { .. } => "gameStarted",
            Self::StateUpdate { .. } => "stateUpdate",
            Self::CardsDrawn { .. } => "cardsDrawn",
            Self::CardsStolen { .. } => "cardsStolen",
            Self::ExtraTurnGranted { .. } => "extraTurnGranted",
            Self::PeekTop { .. } => "peekTop",
            Self::GameOver { .. } => "gameOver",
            Self::PlayerJoined { .. } => "playerJoined",
            Self::PlayerLeft { .. } => "playerLeft",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::UserError;

    #[test]
    fn test_decode_create_room() {
        let envelope: ClientEnvelope =
            serde_json::from_str(r#"{"id":1,"type":"createRoom","mode":"sudden-death"}"#).unwrap();
        assert_eq!(envelope.id, 1);
        assert_eq!(
            envelope.action,
            ClientAction::CreateRoom {
                mode: GameMode::SuddenDeath
            }
        );

        let default_mode: ClientEnvelope =
            serde_json::from_str(r#"{"id":2,"type":"createRoom"}"#).unwrap();
        assert_eq!(
            default_mode.action,
            ClientAction::CreateRoom {
                mode: GameMode::Standard
            }
        );
    }

    #[test]
    fn test_decode_play_card_with_options() {
        let envelope: ClientEnvelope = serde_json::from_str(
            r#"{"id":7,"type":"playCard","roomId":"ABC123","playerIndex":0,"handIndex":3,
                "options":{"action":"delete","seqIndex":1}}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.action,
            ClientAction::PlayCard {
                room_id: "ABC123".to_string(),
                player_index: 0,
                hand_index: 3,
                options: PlayOptions::JokerDelete { seq_index: Some(1) },
            }
        );
        assert_eq!(envelope.action.to_string(), "playCard in ABC123");
    }

    #[test]
    fn test_decode_lay_sequence() {
        let envelope: ClientEnvelope = serde_json::from_str(
            r#"{"id":9,"type":"laySequence","roomId":"R","playerIndex":1,"handIndices":[0,2,4]}"#,
        )
        .unwrap();
        assert_eq!(envelope.action.room_id(), Some("R"));
        assert_eq!(envelope.action.name(), "laySequence");
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(serde_json::from_str::<ClientEnvelope>(r#"{"id":1,"type":"cheat"}"#).is_err());
    }

    #[test]
    fn test_ack_shapes() {
        let ok = serde_json::to_value(ServerMessage::ack(
            4,
            Some(AckData::RoomCreated {
                room_id: "Q1W2E3".to_string(),
                player_index: 0,
            }),
        ))
        .unwrap();
        assert_eq!(ok["type"], "ack");
        assert_eq!(ok["id"], 4);
        assert_eq!(ok["ok"], true);
        assert_eq!(ok["roomId"], "Q1W2E3");
        assert_eq!(ok["playerIndex"], 0);
        assert!(ok.get("reason").is_none());

        let rejected = serde_json::to_value(ServerMessage::rejected(
            5,
            &RoomError::User(UserError::NotYourTurn),
        ))
        .unwrap();
        assert_eq!(rejected["ok"], false);
        assert_eq!(rejected["code"], "NotYourTurn");
        assert_eq!(rejected["reason"], "not your turn");
    }

    #[test]
    fn test_broadcast_field_names() {
        let json = serde_json::to_value(ServerMessage::CardsDrawn {
            player_index: 1,
            count: 2,
            new_hand_size: 6,
        })
        .unwrap();
        assert_eq!(json["type"], "cardsDrawn");
        assert_eq!(json["playerIndex"], 1);
        assert_eq!(json["newHandSize"], 6);
        assert_eq!(ServerMessage::GameOver { winner: 0 }.kind(), "gameOver");
    }
}
