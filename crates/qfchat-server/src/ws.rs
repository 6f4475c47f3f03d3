//! WebSocket event layer.
//!
//! Frames are JSON envelopes of the form `{"event": ..., "data": ...}`,
//! keeping the event names of the original socket.io protocol.  Inbound
//! events carry the asserted sender identity in their payload; the relay
//! trusts it as-is.  A malformed frame is logged and skipped -- it must never
//! tear down the connection loop for the rest of the room.

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use qfchat_store::{Chat, ChatId, Message};

use crate::api::AppState;
use crate::relay::ConnId;

// ---------------------------------------------------------------------------
// Event protocol
// ---------------------------------------------------------------------------

/// Events a client may send.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Subscribe this connection to a chat's room.  Payload is the bare
    /// chat id.
    JoinChat(ChatId),
    /// Append a message and fan it out to the room.
    SendMessage(SendMessagePayload),
    /// Find or create the DM for a user pair; the reply goes to this
    /// connection only.
    CreateDm(CreateDmPayload),
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    NewMessage(Message),
    DmCreated(Chat),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub chat_id: ChatId,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDmPayload {
    pub user_id: Uuid,
    pub contact_id: Uuid,
}

// ---------------------------------------------------------------------------
// Connection handling
// ---------------------------------------------------------------------------

/// `GET /ws` upgrade entry point.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one WebSocket connection until either side goes away.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (conn_id, mut events) = state.relay.connect().await;
    let (mut sink, mut stream) = socket.split();

    // Relay queue -> socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(conn = %conn_id, error = %e, "Failed to encode event");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Socket -> event dispatch.
    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = stream.next().await {
            let WsMessage::Text(text) = frame else {
                continue;
            };
            match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => handle_event(&recv_state, conn_id, event).await,
                Err(e) => {
                    warn!(conn = %conn_id, error = %e, "Ignoring malformed event");
                }
            }
        }
    });

    // Whichever half finishes first takes the connection down with it.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.relay.disconnect(conn_id).await;
}

/// Dispatch one decoded client event.
pub(crate) async fn handle_event(state: &AppState, conn_id: ConnId, event: ClientEvent) {
    match event {
        ClientEvent::JoinChat(chat_id) => {
            state.relay.join(conn_id, &chat_id).await;
        }
        ClientEvent::SendMessage(payload) => {
            let message = state
                .store
                .append_message(
                    &payload.chat_id,
                    payload.sender_id,
                    &payload.sender_name,
                    &payload.content,
                )
                .await;
            debug!(chat = %message.chat_id, message = %message.id, "Message appended");
            let chat_id = message.chat_id.clone();
            state
                .relay
                .broadcast(&chat_id, ServerEvent::NewMessage(message))
                .await;
        }
        ClientEvent::CreateDm(payload) => {
            let chat = state
                .store
                .find_or_create_dm(payload.user_id, payload.contact_id)
                .await;
            state.relay.send_to(conn_id, ServerEvent::DmCreated(chat)).await;
        }
    }
}
