//! Append-only per-chat message logs.

use chrono::Utc;
use uuid::Uuid;

use crate::models::Message;
use crate::store::ChatStore;

impl ChatStore {
    /// Append a message to a chat's log and return the stored record.
    ///
    /// The log is created lazily on first append; arrival order is stored
    /// order.  `sender_name` is snapshotted as given and never updated.
    pub async fn append_message(
        &self,
        chat_id: &str,
        sender_id: Uuid,
        sender_name: &str,
        content: &str,
    ) -> Message {
        let mut state = self.state.write().await;

        let message = Message {
            id: Uuid::new_v4(),
            chat_id: chat_id.to_owned(),
            sender_id,
            sender_name: sender_name.to_owned(),
            content: content.to_owned(),
            timestamp: Utc::now(),
        };
        state
            .messages
            .entry(chat_id.to_owned())
            .or_default()
            .push(message.clone());

        message
    }

    /// A chat's messages, oldest first.
    ///
    /// Unknown chats and chats without messages both yield an empty vec, not
    /// an error.
    pub async fn list_messages(&self, chat_id: &str) -> Vec<Message> {
        self.state
            .read()
            .await
            .messages
            .get(chat_id)
            .cloned()
            .unwrap_or_default()
    }
}
