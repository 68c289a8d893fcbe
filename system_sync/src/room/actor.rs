//! Room actor: one task per room owning the match and the seat bindings.
//!
//! Every message is handled to completion before the next is read, which is
//! what keeps two actions against the same match from interleaving.

use log::{debug, info, warn};
use rand::{SeedableRng, rngs::StdRng};
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::{
    config::RoomConfig,
    messages::{
        CommandReply, ConnectionId, JoinAccepted, LeaveOutcome, MatchCommand, Outbox, RoomCode,
        RoomError, RoomMessage, RoomResult,
    },
};
use crate::{
    game::{
        ClientView, Concealment, Match, MatchEvent, UserError, constants::MAX_PLAYERS,
        entities::Slot, project,
    },
    net::messages::{ServerMessage, StateMeta},
};

/// Room actor handle for sending messages
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    code: RoomCode,
}

impl RoomHandle {
    pub fn new(sender: mpsc::Sender<RoomMessage>, code: RoomCode) -> Self {
        Self { sender, code }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub async fn send(&self, message: RoomMessage) -> RoomResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| RoomError::RoomClosed)
    }
}

/// Room actor managing one match and up to two connections
pub struct RoomActor {
    code: RoomCode,
    config: RoomConfig,

    /// Connection bound to each seat
    slots: [Option<ConnectionId>; MAX_PLAYERS],

    /// Where broadcasts for each bound connection go
    outboxes: HashMap<ConnectionId, Outbox>,

    /// Current match, replaced on every start
    game: Option<Match>,

    rng: StdRng,
    inbox: mpsc::Receiver<RoomMessage>,
}

impl RoomActor {
    /// Create a room with `host` bound to seat 0.
    ///
    /// # Returns
    ///
    /// * `(RoomActor, RoomHandle)` - Actor to spawn and handle for sending messages
    pub fn new(
        code: RoomCode,
        config: RoomConfig,
        host: ConnectionId,
        host_outbox: Outbox,
    ) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity.max(1));
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut outboxes = HashMap::new();
        outboxes.insert(host, host_outbox);

        let actor = Self {
            code: code.clone(),
            config,
            slots: [Some(host), None],
            outboxes,
            game: None,
            rng,
            inbox,
        };
        (actor, RoomHandle::new(sender, code))
    }

    /// Run the room actor event loop until the last connection leaves or
    /// every handle is dropped.
    pub async fn run(mut self) {
        info!("Room {} ({}) open", self.code, self.config.mode);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
            if self.bound_count() == 0 {
                break;
            }
        }

        info!("Room {} closed", self.code);
    }

    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                connection,
                outbox,
                response,
            } => {
                let _ = response.send(self.handle_join(connection, outbox));
            }

            RoomMessage::Leave {
                connection,
                response,
            } => {
                let _ = response.send(self.handle_leave(connection));
            }

            RoomMessage::StartGame {
                connection,
                response,
            } => {
                let _ = response.send(self.handle_start(connection));
            }

            RoomMessage::Command {
                connection,
                command,
                response,
            } => {
                let name = command.name();
                let result = self.handle_command(connection, command);
                if let Err(error) = &result {
                    debug!("Room {}: {name} rejected: {error}", self.code);
                }
                let _ = response.send(result);
            }

            RoomMessage::GetState {
                connection,
                response,
            } => {
                let result = self
                    .slot_of(connection)
                    .and_then(|_| self.game.as_ref().ok_or(UserError::NoGameInProgress.into()))
                    .map(ClientView::from);
                let _ = response.send(result);
            }
        }
    }

    fn handle_join(&mut self, connection: ConnectionId, outbox: Outbox) -> RoomResult<JoinAccepted> {
        let player_index = match self.slot_of(connection) {
            Ok(slot) => slot,
            Err(_) => {
                let slot = self
                    .slots
                    .iter()
                    .position(Option::is_none)
                    .ok_or(RoomError::RoomFull)?;
                self.slots[slot] = Some(connection);
                self.outboxes.insert(connection, outbox);
                info!("Room {}: {connection} joined as seat {slot}", self.code);
                self.broadcast(&ServerMessage::PlayerJoined {
                    connection_id: connection,
                    player_index: slot,
                });
                slot
            }
        };

        Ok(JoinAccepted {
            player_index,
            mode: self.config.mode,
            sequences_to_win: self.config.sequences_to_win(),
        })
    }

    fn handle_leave(&mut self, connection: ConnectionId) -> RoomResult<LeaveOutcome> {
        let slot = self.slot_of(connection)?;
        self.slots[slot] = None;
        self.outboxes.remove(&connection);
        if let Some(game) = self.game.as_mut() {
            game.revoke_reorder(slot);
        }
        info!("Room {}: {connection} left seat {slot}", self.code);

        self.broadcast(&ServerMessage::PlayerLeft {
            connection_id: connection,
            player_index: slot,
        });
        Ok(LeaveOutcome {
            player_index: slot,
            remaining: self.bound_count(),
        })
    }

    fn handle_start(&mut self, connection: ConnectionId) -> RoomResult<()> {
        if self.slot_of(connection)? != 0 {
            return Err(RoomError::NotHost);
        }
        if self.bound_count() < MAX_PLAYERS {
            return Err(RoomError::NotEnoughPlayers);
        }
        if self.game.is_some() {
            info!("Room {}: replacing the previous match", self.code);
        }

        let mut game = Match::start(self.config.mode, &mut self.rng);
        for event in game.drain_events() {
            debug!("Room {}: {event}", self.code);
        }
        let state = ClientView::from(&game);
        let meta = self.meta(&game);
        self.game = Some(game);

        info!("Room {}: game started", self.code);
        self.broadcast(&ServerMessage::GameStarted {
            state: state.clone(),
        });
        self.broadcast(&ServerMessage::StateUpdate { state, meta });
        Ok(())
    }

    fn handle_command(
        &mut self,
        connection: ConnectionId,
        command: MatchCommand,
    ) -> RoomResult<CommandReply> {
        let slot = self.slot_of(connection)?;
        let game = self.game.as_mut().ok_or(UserError::NoGameInProgress)?;

        let drawn = match command {
            MatchCommand::PlayCard {
                player_index,
                hand_index,
                options,
            } => {
                claim(slot, player_index)?;
                game.play_card(slot, hand_index, options, &mut self.rng)?;
                None
            }
            MatchCommand::EndTurn => {
                game.end_turn(slot)?;
                None
            }
            MatchCommand::LaySequence {
                player_index,
                hand_indices,
            } => {
                claim(slot, player_index)?;
                game.lay_sequence(slot, &hand_indices)?;
                None
            }
            MatchCommand::ReorderTop { new_order_ids } => {
                game.reorder_top(slot, &new_order_ids)?;
                None
            }
            MatchCommand::SortHand => {
                game.sort_hand(slot)?;
                None
            }
            MatchCommand::DrawUpToFour => Some(game.draw_up_to_four(slot)?),
        };

        // Finished matches refuse every command, so only the winning one sees this.
        let finished = game.is_finished();

        self.publish();
        Ok(CommandReply { drawn, finished })
    }

    /// Sends the notifications for whatever the last command did, then the
    /// state update, then the game over notice.
    fn publish(&mut self) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let events = game.drain_events();

        let mut concealment = None;
        let mut winner = None;
        for event in events {
            debug!("Room {}: {event}", self.code);
            match event {
                MatchEvent::CardsDrawn {
                    player_index,
                    count,
                    new_hand_size,
                } => self.broadcast(&ServerMessage::CardsDrawn {
                    player_index,
                    count,
                    new_hand_size,
                }),
                MatchEvent::ExtraTurnGranted {
                    player_index,
                    remaining,
                } => self.broadcast(&ServerMessage::ExtraTurnGranted {
                    player_index,
                    remaining,
                }),
                MatchEvent::PeekTop { player_index, top3 } => {
                    self.send_to_slot(player_index, ServerMessage::PeekTop { top3 });
                }
                MatchEvent::CardsStolen {
                    player_index,
                    card_ids,
                    ..
                } => {
                    self.broadcast(&ServerMessage::CardsStolen {
                        player_index,
                        count: card_ids.len(),
                    });
                    concealment = Some(Concealment::new(player_index, card_ids));
                }
                MatchEvent::GameOver { winner: seat } => winner = Some(seat),
                MatchEvent::TurnStarted { .. }
                | MatchEvent::SequenceLaid { .. }
                | MatchEvent::SequenceDeleted { .. } => {}
            }
        }

        self.broadcast_state(concealment.as_ref());
        if let Some(winner) = winner {
            info!("Room {}: seat {winner} won", self.code);
            self.broadcast(&ServerMessage::GameOver { winner });
        }
    }

    /// Full state to everyone, unless a concealment is given: then the
    /// masked projection is computed once and sent to every connection except
    /// the owner, who gets the full state.
    fn broadcast_state(&self, concealment: Option<&Concealment>) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        let meta = self.meta(game);
        let full = ServerMessage::StateUpdate {
            state: ClientView::from(game),
            meta: meta.clone(),
        };

        let Some(concealment) = concealment else {
            self.broadcast(&full);
            return;
        };
        let masked = ServerMessage::StateUpdate {
            state: project(game, None, Some(concealment)),
            meta,
        };
        for slot in 0..MAX_PLAYERS {
            let message = if concealment.reveals_to(Some(slot)) {
                full.clone()
            } else {
                masked.clone()
            };
            self.send_to_slot(slot, message);
        }
    }

    fn meta(&self, game: &Match) -> StateMeta {
        StateMeta {
            mode: self.config.mode,
            sequences_to_win: self.config.sequences_to_win(),
            drawn_this_turn_count: game.turn().drawn_this_turn_count,
            discarded_this_turn_for: game.turn().discarded_this_turn_for,
        }
    }

    fn broadcast(&self, message: &ServerMessage) {
        for connection in self.slots.iter().flatten() {
            self.deliver(*connection, message.clone());
        }
    }

    fn send_to_slot(&self, slot: Slot, message: ServerMessage) {
        if let Some(Some(connection)) = self.slots.get(slot) {
            self.deliver(*connection, message);
        }
    }

    /// Never blocks the room: a full or closed outbox drops the message.
    fn deliver(&self, connection: ConnectionId, message: ServerMessage) {
        let Some(outbox) = self.outboxes.get(&connection) else {
            return;
        };
        match outbox.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => warn!(
                "Room {}: outbox of {connection} full, dropped {}",
                self.code,
                message.kind()
            ),
            Err(TrySendError::Closed(_)) => {
                debug!("Room {}: {connection} outbox closed", self.code);
            }
        }
    }

    fn slot_of(&self, connection: ConnectionId) -> RoomResult<Slot> {
        self.slots
            .iter()
            .position(|bound| *bound == Some(connection))
            .ok_or(RoomError::NotInRoom)
    }

    fn bound_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}

/// The seat a payload names must be the sender's own seat.
fn claim(slot: Slot, claimed: Slot) -> Result<(), UserError> {
    if slot == claimed {
        Ok(())
    } else {
        Err(UserError::NotYourTurn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    async fn request<T>(
        handle: &RoomHandle,
        build: impl FnOnce(oneshot::Sender<RoomResult<T>>) -> RoomMessage,
    ) -> RoomResult<T> {
        let (tx, rx) = oneshot::channel();
        handle.send(build(tx)).await?;
        rx.await.map_err(|_| RoomError::RoomClosed)?
    }

    fn spawn_room(seed: u64) -> (RoomHandle, ConnectionId, mpsc::Receiver<ServerMessage>) {
        let host = ConnectionId::new();
        let (outbox, rx) = mpsc::channel(64);
        let config = RoomConfig {
            seed: Some(seed),
            ..Default::default()
        };
        let (actor, handle) = RoomActor::new("TEST01".to_string(), config, host, outbox);
        tokio::spawn(actor.run());
        (handle, host, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    #[tokio::test]
    async fn test_join_fills_then_rejects() {
        let (handle, _host, mut host_rx) = spawn_room(1);
        let guest = ConnectionId::new();
        let (guest_outbox, _guest_rx) = mpsc::channel(8);

        let joined = request(&handle, |response| RoomMessage::Join {
            connection: guest,
            outbox: guest_outbox,
            response,
        })
        .await
        .unwrap();
        assert_eq!(joined.player_index, 1);
        assert_eq!(joined.sequences_to_win, 3);
        assert!(matches!(
            drain(&mut host_rx).as_slice(),
            [ServerMessage::PlayerJoined { player_index: 1, .. }]
        ));

        let (third_outbox, _third_rx) = mpsc::channel(8);
        let third = request(&handle, |response| RoomMessage::Join {
            connection: ConnectionId::new(),
            outbox: third_outbox,
            response,
        })
        .await;
        assert_eq!(third, Err(RoomError::RoomFull));
    }

    #[tokio::test]
    async fn test_start_requires_host_and_guest() {
        let (handle, host, _host_rx) = spawn_room(2);
        let alone = request(&handle, |response| RoomMessage::StartGame {
            connection: host,
            response,
        })
        .await;
        assert_eq!(alone, Err(RoomError::NotEnoughPlayers));

        let guest = ConnectionId::new();
        let (guest_outbox, mut guest_rx) = mpsc::channel(8);
        request(&handle, |response| RoomMessage::Join {
            connection: guest,
            outbox: guest_outbox,
            response,
        })
        .await
        .unwrap();

        let by_guest = request(&handle, |response| RoomMessage::StartGame {
            connection: guest,
            response,
        })
        .await;
        assert_eq!(by_guest, Err(RoomError::NotHost));

        request(&handle, |response| RoomMessage::StartGame {
            connection: host,
            response,
        })
        .await
        .unwrap();
        let kinds: Vec<_> = drain(&mut guest_rx).iter().map(ServerMessage::kind).collect();
        assert_eq!(kinds, vec!["playerJoined", "gameStarted", "stateUpdate"]);
    }

    #[tokio::test]
    async fn test_claimed_seat_must_match() {
        let (handle, host, _host_rx) = spawn_room(3);
        let guest = ConnectionId::new();
        let (guest_outbox, _guest_rx) = mpsc::channel(8);
        request(&handle, |response| RoomMessage::Join {
            connection: guest,
            outbox: guest_outbox,
            response,
        })
        .await
        .unwrap();
        request(&handle, |response| RoomMessage::StartGame {
            connection: host,
            response,
        })
        .await
        .unwrap();

        let spoofed = request(&handle, |response| RoomMessage::Command {
            connection: guest,
            command: MatchCommand::PlayCard {
                player_index: 0,
                hand_index: 0,
                options: Default::default(),
            },
            response,
        })
        .await;
        assert_eq!(spoofed, Err(RoomError::User(UserError::NotYourTurn)));
    }

    #[tokio::test]
    async fn test_actor_stops_when_last_connection_leaves() {
        let (handle, host, _host_rx) = spawn_room(4);
        let outcome = request(&handle, |response| RoomMessage::Leave {
            connection: host,
            response,
        })
        .await
        .unwrap();
        assert_eq!(outcome.remaining, 0);

        let after = request(&handle, |response| RoomMessage::GetState {
            connection: host,
            response,
        })
        .await;
        assert_eq!(after, Err(RoomError::RoomClosed));
    }

    #[tokio::test]
    async fn test_commands_before_start() {
        let (handle, host, _host_rx) = spawn_room(5);
        let result = request(&handle, |response| RoomMessage::Command {
            connection: host,
            command: MatchCommand::EndTurn,
            response,
        })
        .await;
        assert_eq!(result, Err(RoomError::User(UserError::NoGameInProgress)));

        let stranger = request(&handle, |response| RoomMessage::Command {
            connection: ConnectionId::new(),
            command: MatchCommand::SortHand,
            response,
        })
        .await;
        assert_eq!(stranger, Err(RoomError::NotInRoom));
    }
}
