//! One client connection's view of the room registry.
//!
//! A session remembers which rooms its connection is bound to so that a
//! disconnect can leave all of them. Broadcasts reach the connection through
//! its outbox; [`Session::handle`] returns the acknowledgment for the request.

use log::debug;
use std::collections::BTreeSet;

use super::messages::{AckData, ClientAction, ClientEnvelope, ServerMessage};
use crate::room::{
    CommandReply, ConnectionId, MatchCommand, Outbox, RoomCode, RoomManager, RoomResult,
};

pub struct Session {
    connection: ConnectionId,
    outbox: Outbox,
    rooms: BTreeSet<RoomCode>,
    matches_won: u64,
}

impl Session {
    pub fn new(outbox: Outbox) -> Self {
        Self::with_id(ConnectionId::new(), outbox)
    }

    pub fn with_id(connection: ConnectionId, outbox: Outbox) -> Self {
        Self {
            connection,
            outbox,
            rooms: BTreeSet::new(),
            matches_won: 0,
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Rooms this connection is currently bound to.
    pub fn rooms(&self) -> impl Iterator<Item = &str> {
        self.rooms.iter().map(String::as_str)
    }

    /// Matches this connection has ended with a winning command.
    pub fn matches_won(&self) -> u64 {
        self.matches_won
    }

    /// Runs one request to completion and builds its acknowledgment.
    pub async fn handle(&mut self, manager: &RoomManager, envelope: ClientEnvelope) -> ServerMessage {
        let ClientEnvelope { id, action } = envelope;
        let name = action.name();
        match self.dispatch(manager, action).await {
            Ok(data) => ServerMessage::ack(id, data),
            Err(error) => {
                debug!("{} {name} rejected: {error}", self.connection);
                ServerMessage::rejected(id, &error)
            }
        }
    }

    async fn dispatch(
        &mut self,
        manager: &RoomManager,
        action: ClientAction,
    ) -> RoomResult<Option<AckData>> {
        let connection = self.connection;
        match action {
            ClientAction::CreateRoom { mode } => {
                let room_id = manager
                    .create_room(mode, connection, self.outbox.clone())
                    .await?;
                self.rooms.insert(room_id.clone());
                Ok(Some(AckData::RoomCreated {
                    room_id,
                    player_index: 0,
                }))
            }
            ClientAction::JoinRoom { room_id } => {
                let joined = manager
                    .join_room(&room_id, connection, self.outbox.clone())
                    .await?;
                self.rooms.insert(room_id);
                Ok(Some(AckData::RoomJoined {
                    player_index: joined.player_index,
                    mode: joined.mode,
                    sequences_to_win: joined.sequences_to_win,
                }))
            }
            ClientAction::StartGame { room_id } => {
                manager.start_game(&room_id, connection).await?;
                Ok(None)
            }
            ClientAction::PlayCard {
                room_id,
                player_index,
                hand_index,
                options,
            } => {
                let command = MatchCommand::PlayCard {
                    player_index,
                    hand_index,
                    options,
                };
                self.execute(manager, &room_id, command).await
            }
            ClientAction::EndTurn { room_id } => {
                self.execute(manager, &room_id, MatchCommand::EndTurn).await
            }
            ClientAction::LaySequence {
                room_id,
                player_index,
                hand_indices,
            } => {
                let command = MatchCommand::LaySequence {
                    player_index,
                    hand_indices,
                };
                self.execute(manager, &room_id, command).await
            }
            ClientAction::ReorderTop {
                room_id,
                new_order_ids,
            } => {
                let command = MatchCommand::ReorderTop { new_order_ids };
                self.execute(manager, &room_id, command).await
            }
            ClientAction::SortHand { room_id } => {
                self.execute(manager, &room_id, MatchCommand::SortHand).await
            }
            ClientAction::DrawUpToFour { room_id } => {
                self.execute(manager, &room_id, MatchCommand::DrawUpToFour)
                    .await
            }
            ClientAction::GetState { room_id } => {
                let state = manager.get_state(&room_id, connection).await?;
                Ok(Some(AckData::State { state }))
            }
            ClientAction::LeaveRoom { room_id } => {
                manager.leave_room(&room_id, connection).await?;
                self.rooms.remove(&room_id);
                Ok(None)
            }
        }
    }

    async fn execute(
        &mut self,
        manager: &RoomManager,
        room_id: &str,
        command: MatchCommand,
    ) -> RoomResult<Option<AckData>> {
        let reply = manager.execute(room_id, self.connection, command).await?;
        let CommandReply { drawn, finished } = reply;
        if finished {
            self.matches_won += 1;
        }
        Ok(drawn.map(|drawn| AckData::Drawn { drawn }))
    }

    /// Leaves every room the connection is still bound to.
    pub async fn close(mut self, manager: &RoomManager) {
        let rooms = std::mem::take(&mut self.rooms);
        manager.disconnect(self.connection, rooms).await;
    }
}
