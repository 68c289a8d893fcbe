//! Room manager: the process-wide registry from room code to room actor.

use log::info;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{Mutex, RwLock, oneshot};

use super::{
    actor::{RoomActor, RoomHandle},
    config::{GameMode, ManagerSettings},
    messages::{
        CommandReply, ConnectionId, JoinAccepted, LeaveOutcome, MatchCommand, Outbox, RoomCode,
        RoomError, RoomMessage, RoomResult,
    },
};
use crate::game::{ClientView, constants::ROOM_CODE_LENGTH};

const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Six uppercase base-36 characters.
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    (0..ROOM_CODE_LENGTH)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect()
}

/// Room manager for creating rooms and routing requests to them.
///
/// Cloning is cheap and every clone shares the same registry.
#[derive(Clone)]
pub struct RoomManager {
    /// Active room handles
    rooms: Arc<RwLock<HashMap<RoomCode, RoomHandle>>>,

    settings: ManagerSettings,

    /// Rooms created so far, used to derive per-room seeds
    created: Arc<AtomicU64>,

    /// Source of room codes
    code_rng: Arc<Mutex<StdRng>>,
}

impl RoomManager {
    /// Create an empty registry
    ///
    /// # Arguments
    ///
    /// * `settings` - Seed and inbox size applied to every room
    pub fn new(settings: ManagerSettings) -> Self {
        let code_rng = match settings.base_seed {
            Some(seed) => StdRng::seed_from_u64(seed.rotate_left(32)),
            None => StdRng::from_os_rng(),
        };
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            settings,
            created: Arc::new(AtomicU64::new(0)),
            code_rng: Arc::new(Mutex::new(code_rng)),
        }
    }

    /// Create a room with the requester bound to seat 0 and spawn its actor
    ///
    /// # Arguments
    ///
    /// * `mode` - Game mode of every match played in the room
    /// * `host` - Connection that becomes seat 0
    /// * `outbox` - Where the host's broadcasts go
    ///
    /// # Returns
    ///
    /// * `RoomCode` - Code other players join with
    pub async fn create_room(
        &self,
        mode: GameMode,
        host: ConnectionId,
        outbox: Outbox,
    ) -> RoomResult<RoomCode> {
        let index = self.created.fetch_add(1, Ordering::Relaxed);
        let config = self.settings.room_config(mode, index);
        config.validate().map_err(RoomError::InvalidConfig)?;

        let mut rooms = self.rooms.write().await;
        let code = {
            let mut rng = self.code_rng.lock().await;
            loop {
                let code = generate_room_code(&mut *rng);
                if !rooms.contains_key(&code) {
                    break code;
                }
            }
        };

        let (actor, handle) = RoomActor::new(code.clone(), config, host, outbox);
        rooms.insert(code.clone(), handle);
        drop(rooms);

        tokio::spawn(actor.run());
        info!("Room {code} created by {host} ({mode})");
        Ok(code)
    }

    /// Bind a connection to the lowest free seat of a room
    pub async fn join_room(
        &self,
        code: &str,
        connection: ConnectionId,
        outbox: Outbox,
    ) -> RoomResult<JoinAccepted> {
        self.request(code, |response| RoomMessage::Join {
            connection,
            outbox,
            response,
        })
        .await
    }

    /// Unbind a connection, removing the room once nobody is left in it
    pub async fn leave_room(&self, code: &str, connection: ConnectionId) -> RoomResult<LeaveOutcome> {
        let outcome = self
            .request(code, |response| RoomMessage::Leave {
                connection,
                response,
            })
            .await?;

        if outcome.remaining == 0 {
            self.rooms.write().await.remove(code);
            info!("Room {code} removed");
        }
        Ok(outcome)
    }

    pub async fn start_game(&self, code: &str, connection: ConnectionId) -> RoomResult<()> {
        self.request(code, |response| RoomMessage::StartGame {
            connection,
            response,
        })
        .await
    }

    pub async fn execute(
        &self,
        code: &str,
        connection: ConnectionId,
        command: MatchCommand,
    ) -> RoomResult<CommandReply> {
        self.request(code, |response| RoomMessage::Command {
            connection,
            command,
            response,
        })
        .await
    }

    pub async fn get_state(&self, code: &str, connection: ConnectionId) -> RoomResult<ClientView> {
        self.request(code, |response| RoomMessage::GetState {
            connection,
            response,
        })
        .await
    }

    /// Leave every listed room, ignoring rooms that are already gone.
    pub async fn disconnect<I>(&self, connection: ConnectionId, codes: I)
    where
        I: IntoIterator<Item = RoomCode>,
    {
        for code in codes {
            if let Err(error) = self.leave_room(&code, connection).await {
                log::debug!("{connection} leaving {code} on disconnect: {error}");
            }
        }
    }

    /// Number of live rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn room_exists(&self, code: &str) -> bool {
        self.rooms.read().await.contains_key(code)
    }

    async fn handle(&self, code: &str) -> RoomResult<RoomHandle> {
        self.rooms
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or(RoomError::RoomNotFound)
    }

    /// Sends one message to a room and waits for its reply. A room that
    /// stops before answering reads as not found.
    async fn request<T>(
        &self,
        code: &str,
        build: impl FnOnce(oneshot::Sender<RoomResult<T>>) -> RoomMessage,
    ) -> RoomResult<T> {
        let handle = self.handle(code).await?;
        let (response, reply) = oneshot::channel();
        handle
            .send(build(response))
            .await
            .map_err(|_| RoomError::RoomNotFound)?;
        reply.await.map_err(|_| RoomError::RoomNotFound)?
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(ManagerSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_room_code_shape() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let code = generate_room_code(&mut rng);
            assert_eq!(code.len(), ROOM_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[tokio::test]
    async fn test_create_and_remove_room() {
        let manager = RoomManager::default();
        let host = ConnectionId::new();
        let (outbox, _rx) = mpsc::channel(8);

        let code = manager
            .create_room(GameMode::Standard, host, outbox)
            .await
            .unwrap();
        assert!(manager.room_exists(&code).await);
        assert_eq!(manager.room_count().await, 1);

        let outcome = manager.leave_room(&code, host).await.unwrap();
        assert_eq!(outcome.player_index, 0);
        assert_eq!(manager.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_zero_inbox() {
        let manager = RoomManager::new(ManagerSettings {
            base_seed: None,
            inbox_capacity: Some(0),
        });
        let (outbox, _rx) = mpsc::channel(8);

        let result = manager
            .create_room(GameMode::Standard, ConnectionId::new(), outbox)
            .await;
        assert!(matches!(result, Err(RoomError::InvalidConfig(_))));
        assert_eq!(result.unwrap_err().code(), "InvalidConfig");
        assert_eq!(manager.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_room() {
        let manager = RoomManager::default();
        let (outbox, _rx) = mpsc::channel(8);
        let result = manager.join_room("NOPE00", ConnectionId::new(), outbox).await;
        assert_eq!(result, Err(RoomError::RoomNotFound));
    }

    #[tokio::test]
    async fn test_join_echoes_mode() {
        let manager = RoomManager::default();
        let (host_outbox, _host_rx) = mpsc::channel(8);
        let (guest_outbox, _guest_rx) = mpsc::channel(8);
        let code = manager
            .create_room(GameMode::SuddenDeath, ConnectionId::new(), host_outbox)
            .await
            .unwrap();

        let joined = manager
            .join_room(&code, ConnectionId::new(), guest_outbox)
            .await
            .unwrap();
        assert_eq!(joined.player_index, 1);
        assert_eq!(joined.mode, GameMode::SuddenDeath);
        assert_eq!(joined.sequences_to_win, 1);
    }
}
