//! Rooms: short-lived sessions that bind two connections to the seats of a
//! match and broadcast its state.
//!
//! ## Architecture
//!
//! Each room runs in its own Tokio task with an mpsc inbox, so all
//! mutations of one match are serialized while separate rooms never
//! contend. The [`RoomManager`] maps room codes to actor handles and is
//! passed explicitly to whoever needs it.
//!
//! ## Example
//!
//! ```no_run
//! use system_sync::room::{ConnectionId, GameMode, RoomManager};
//! use tokio::sync::mpsc;
//!
//! # async fn demo() {
//! let manager = RoomManager::default();
//! let (outbox, _inbox) = mpsc::channel(64);
//! let code = manager
//!     .create_room(GameMode::Standard, ConnectionId::new(), outbox)
//!     .await
//!     .unwrap();
//! assert_eq!(code.len(), 6);
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

pub use actor::{RoomActor, RoomHandle};
pub use config::{GameMode, ManagerSettings, RoomConfig};
pub use manager::{RoomManager, generate_room_code};
pub use messages::{
    CommandReply, ConnectionId, JoinAccepted, LeaveOutcome, MatchCommand, Outbox, RoomCode,
    RoomError, RoomMessage, RoomResult,
};
