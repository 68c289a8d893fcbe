//! WebSocket endpoint: one session per connection.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. Server spawns a send task draining the connection's outbox
//! 3. Each text frame is flood-checked, decoded and run through the session;
//!    its acknowledgment goes through the same outbox, after any broadcast
//!    the action caused
//! 4. On disconnect the session leaves every room it is bound to
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3000/ws');
//! ws.send(JSON.stringify({ id: 1, type: "createRoom", mode: "standard" }));
//! // <- {"type":"ack","id":1,"ok":true,"roomId":"K3Q9ZD","playerIndex":0}
//! ```

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::Ordering;
use system_sync::{
    Session,
    messages::{ClientAction, ServerMessage},
    utils,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{AppState, flood_guard::FloodGuard};
use crate::{logging, metrics};

/// Code sent back for messages refused by the flood guard.
pub const RATE_LIMITED: &str = "RateLimited";

/// Upgrade HTTP connection to WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    // Oversized frames below this get a MessageTooLarge ack; above it the
    // socket is closed.
    ws.max_message_size(utils::MAX_MESSAGE_SIZE * 4)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection until it closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (outbox, mut outbox_rx) =
        mpsc::channel::<ServerMessage>(state.config.connection.outbox_capacity);
    let mut session = Session::new(outbox.clone());
    let mut guard = FloodGuard::from_config(&state.config.connection);
    let connection_id = session.connection().to_string();

    let active = state.connections.fetch_add(1, Ordering::Relaxed) + 1;
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(active);
    info!(connection_id = %connection_id, "WebSocket connected");

    let send_task = tokio::spawn(async move {
        while let Some(message) = outbox_rx.recv().await {
            let kind = message.kind();

            let json = match utils::encode(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize {}: {}", kind, e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            metrics::websocket_messages_sent(kind);
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();
                let ack = handle_text(&mut session, &mut guard, &state, text.as_str()).await;
                if outbox.send(ack).await.is_err() {
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                let ack = ServerMessage::nack(0, "MalformedMessage", "expected a text frame");
                if outbox.send(ack).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                debug!(connection_id = %connection_id, "Close frame received");
                break;
            }
            Err(e) => {
                warn!(connection_id = %connection_id, "WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    let rooms: Vec<String> = session.rooms().map(str::to_string).collect();
    session.close(&state.rooms).await;
    drop(outbox);
    send_task.abort();

    let active = state.connections.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
    metrics::websocket_connections_active(active);
    metrics::active_rooms(state.rooms.room_count().await);
    info!(connection_id = %connection_id, ?rooms, "WebSocket disconnected");
}

/// Runs one client text frame and returns the acknowledgment to send back.
pub async fn handle_text(
    session: &mut Session,
    guard: &mut FloodGuard,
    state: &AppState,
    text: &str,
) -> ServerMessage {
    let connection_id = session.connection().to_string();

    if let Err(limit) = guard.check() {
        metrics::flood_guard_hits_total(limit.label());
        logging::log_refused_message(&connection_id, RATE_LIMITED, limit.reason());
        return ServerMessage::nack(utils::peek_request_id(text), RATE_LIMITED, limit.reason());
    }

    let envelope = match utils::decode_envelope(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            metrics::rejected_actions_total(e.code());
            logging::log_refused_message(&connection_id, e.code(), &e.to_string());
            return ServerMessage::nack(utils::peek_request_id(text), e.code(), e.to_string());
        }
    };

    let action = envelope.action.name();
    let room_changing = matches!(
        envelope.action,
        ClientAction::CreateRoom { .. } | ClientAction::LeaveRoom { .. }
    );
    let starting = matches!(envelope.action, ClientAction::StartGame { .. });
    let won_before = session.matches_won();

    let ack = session.handle(&state.rooms, envelope).await;
    if session.matches_won() > won_before {
        metrics::matches_finished_total();
    }
    match &ack {
        ServerMessage::Ack {
            ok: false,
            code: Some(code),
            ..
        } => {
            metrics::rejected_actions_total(code);
            logging::log_rejected_action(&connection_id, action, code);
        }
        ServerMessage::Ack { ok: true, .. } => {
            if room_changing {
                metrics::active_rooms(state.rooms.room_count().await);
            }
            if starting {
                metrics::matches_started_total();
            }
        }
        _ => {}
    }
    ack
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionConfig, ServerConfig};
    use system_sync::{RoomManager, messages::AckData};

    fn state(burst_limit: usize) -> AppState {
        let config = ServerConfig {
            connection: ConnectionConfig {
                burst_limit,
                sustained_limit: burst_limit * 10,
                ..Default::default()
            },
            ..Default::default()
        };
        AppState::new(RoomManager::default(), config)
    }

    fn session() -> (Session, mpsc::Receiver<ServerMessage>) {
        let (outbox, rx) = mpsc::channel(32);
        (Session::new(outbox), rx)
    }

    fn code(ack: &ServerMessage) -> Option<&str> {
        match ack {
            ServerMessage::Ack { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_malformed_text_is_refused_with_id() {
        let state = state(10);
        let (mut session, _rx) = session();
        let mut guard = FloodGuard::from_config(&state.config.connection);

        let ack = handle_text(&mut session, &mut guard, &state, r#"{"id":12,"type":"cheat"}"#).await;
        assert_eq!(code(&ack), Some("MalformedMessage"));
        assert!(matches!(ack, ServerMessage::Ack { id: 12, ok: false, .. }));

        let garbage = handle_text(&mut session, &mut guard, &state, "not json").await;
        assert!(matches!(garbage, ServerMessage::Ack { id: 0, ok: false, .. }));
    }

    #[tokio::test]
    async fn test_flood_guard_refuses_before_rooms() {
        let state = state(2);
        let (mut session, _rx) = session();
        let mut guard = FloodGuard::from_config(&state.config.connection);
        let create = r#"{"id":1,"type":"createRoom"}"#;

        let first = handle_text(&mut session, &mut guard, &state, create).await;
        assert!(matches!(
            first,
            ServerMessage::Ack {
                ok: true,
                data: Some(AckData::RoomCreated { .. }),
                ..
            }
        ));
        handle_text(&mut session, &mut guard, &state, create).await;
        let third = handle_text(&mut session, &mut guard, &state, create).await;
        assert_eq!(code(&third), Some(RATE_LIMITED));
        assert_eq!(state.rooms.room_count().await, 2);
    }

    #[tokio::test]
    async fn test_rule_rejection_passes_through() {
        let state = state(10);
        let (mut session, _rx) = session();
        let mut guard = FloodGuard::from_config(&state.config.connection);

        let ack = handle_text(
            &mut session,
            &mut guard,
            &state,
            r#"{"id":3,"type":"endTurn","roomId":"NOPE00"}"#,
        )
        .await;
        assert_eq!(code(&ack), Some("RoomNotFound"));
    }
}
