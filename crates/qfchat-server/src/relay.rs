//! Realtime relay: connection registry and room fan-out.
//!
//! Rooms are an explicit mapping from chat id to the set of connections
//! subscribed to it; broadcast iterates that set rather than leaning on any
//! transport-level room primitive, so the relay could later sit behind a
//! message bus without protocol changes.  Room membership is runtime-only
//! state and is never persisted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use qfchat_store::ChatId;

use crate::ws::ServerEvent;

/// Opaque identity assigned to a connection when it attaches.
pub type ConnId = Uuid;

/// Per-connection outbound queue depth.  A connection that falls this far
/// behind starts losing events (best-effort delivery).
const EVENT_BUFFER: usize = 256;

struct RelayInner {
    /// Outbound handles for every live connection.
    conns: HashMap<ConnId, mpsc::Sender<ServerEvent>>,
    /// Room membership, keyed by chat id.
    rooms: HashMap<ChatId, HashSet<ConnId>>,
}

/// Cloneable handle to the relay state.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<RwLock<RelayInner>>,
}

impl Relay {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RelayInner {
                conns: HashMap::new(),
                rooms: HashMap::new(),
            })),
        }
    }

    /// Attach a new connection.
    ///
    /// No authentication happens here; identity is asserted per-event by the
    /// client.  Returns the connection id and the receiver the transport
    /// drains into its socket.
    pub async fn connect(&self) -> (ConnId, mpsc::Receiver<ServerEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        self.inner.write().await.conns.insert(conn_id, tx);

        info!(conn = %conn_id, "User connected");
        (conn_id, rx)
    }

    /// Subscribe a connection to the room named by `chat_id`.
    ///
    /// A connection may sit in any number of rooms; there is no unjoin short
    /// of disconnecting.
    pub async fn join(&self, conn_id: ConnId, chat_id: &str) {
        let mut inner = self.inner.write().await;
        if !inner.conns.contains_key(&conn_id) {
            warn!(conn = %conn_id, room = chat_id, "Join from unknown connection");
            return;
        }
        inner
            .rooms
            .entry(chat_id.to_owned())
            .or_default()
            .insert(conn_id);

        debug!(conn = %conn_id, room = chat_id, "Joined room");
    }

    /// Deliver an event to every connection in the room, the sender included
    /// if it has joined.  Slow connections drop the event.
    pub async fn broadcast(&self, chat_id: &str, event: ServerEvent) {
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(chat_id) else {
            return;
        };

        for conn_id in members {
            let Some(tx) = inner.conns.get(conn_id) else {
                continue;
            };
            if tx.try_send(event.clone()).is_err() {
                debug!(
                    room = chat_id,
                    target = %conn_id,
                    "Dropping event for slow connection"
                );
            }
        }
    }

    /// Reply to a single connection (used for `dm-created`, which must not be
    /// broadcast).
    pub async fn send_to(&self, conn_id: ConnId, event: ServerEvent) {
        let inner = self.inner.read().await;
        match inner.conns.get(&conn_id) {
            Some(tx) => {
                if tx.try_send(event).is_err() {
                    debug!(target = %conn_id, "Dropping reply for slow connection");
                }
            }
            None => warn!(conn = %conn_id, "Reply target is gone"),
        }
    }

    /// Detach a connection: its handle and all room memberships vanish.
    /// Application state (users, chats, messages) is untouched.
    pub async fn disconnect(&self, conn_id: ConnId) {
        let mut inner = self.inner.write().await;
        inner.conns.remove(&conn_id);
        inner.rooms.retain(|_, members| {
            members.remove(&conn_id);
            !members.is_empty()
        });

        info!(conn = %conn_id, "User disconnected");
    }

    /// Number of connections currently in a room.
    pub async fn room_size(&self, chat_id: &str) -> usize {
        self.inner
            .read()
            .await
            .rooms
            .get(chat_id)
            .map(|members| members.len())
            .unwrap_or(0)
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}
