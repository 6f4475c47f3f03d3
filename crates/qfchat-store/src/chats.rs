//! Chat registry: deduplicated DM creation and per-user chat listing.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::models::{Chat, ChatKind};
use crate::store::ChatStore;

impl ChatStore {
    /// Return the DM chat for the unordered pair `{user_a, user_b}`, creating
    /// it on first request.
    ///
    /// The search and the insert run under one write-lock acquisition, so at
    /// most one chat record can ever exist for a pair, no matter how many
    /// tasks race on it.  An existing chat is returned untouched.
    pub async fn find_or_create_dm(&self, user_a: Uuid, user_b: Uuid) -> Chat {
        let mut state = self.state.write().await;

        if let Some(existing) = state.chats.values().find(|chat| {
            chat.kind == ChatKind::Dm
                && chat.has_participant(user_a)
                && chat.has_participant(user_b)
        }) {
            return existing.clone();
        }

        let chat = Chat {
            id: format!("dm_{}", state.next_chat_id),
            kind: ChatKind::Dm,
            participants: [user_a, user_b],
            created_at: Utc::now(),
        };
        state.next_chat_id += 1;
        state.chats.insert(chat.id.clone(), chat.clone());

        info!(chat = %chat.id, "Created DM chat");
        chat
    }

    /// All chats the given user participates in.
    pub async fn list_chats_for_user(&self, user_id: Uuid) -> Vec<Chat> {
        let state = self.state.read().await;
        state
            .chats
            .values()
            .filter(|chat| chat.has_participant(user_id))
            .cloned()
            .collect()
    }
}
