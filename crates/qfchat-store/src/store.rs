//! The process-wide state owner.
//!
//! [`ChatStore`] replaces the original design's ambient global maps with an
//! explicit component: constructed once with empty maps, cloned into every
//! handler, dropped at process exit.  Tests build a fresh instance each.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Chat, ChatId, Contact, Message, User};

/// All four domain maps, guarded together.
///
/// Holding one lock over the whole state makes every store operation a single
/// logical step, so the DM dedup search-then-insert cannot interleave with a
/// concurrent insert for the same pair.
pub(crate) struct State {
    pub(crate) users: HashMap<Uuid, User>,
    pub(crate) contacts: HashMap<Uuid, HashMap<Uuid, Contact>>,
    pub(crate) chats: HashMap<ChatId, Chat>,
    pub(crate) messages: HashMap<ChatId, Vec<Message>>,
    pub(crate) next_chat_id: u64,
}

/// Cloneable handle to the in-memory chat state.
#[derive(Clone)]
pub struct ChatStore {
    pub(crate) state: Arc<RwLock<State>>,
}

impl ChatStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                users: HashMap::new(),
                contacts: HashMap::new(),
                chats: HashMap::new(),
                messages: HashMap::new(),
                next_chat_id: 1,
            })),
        }
    }
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}
