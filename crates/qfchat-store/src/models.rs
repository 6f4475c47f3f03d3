//! Domain model structs held in the in-memory store.
//!
//! Every struct derives `Serialize` and `Deserialize` with camelCase field
//! names so it can be handed directly to HTTP and WebSocket clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chat identifiers are opaque strings of the form `dm_{n}` with a
/// monotonically allocated `n`.
pub type ChatId = String;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user.
///
/// The password is stored and compared as plaintext -- a documented
/// limitation of this service, not an accident.  It never leaves the process:
/// API responses carry a [`UserSummary`] instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login name (case-sensitive).
    pub username: String,
    /// Plaintext password.
    #[serde(skip_serializing)]
    pub password: String,
    /// Unique six-digit QfChat number, shared out-of-band so other users can
    /// find this one.
    pub qf_number: u32,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Projection sent to clients: identity without the password.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            qf_number: self.qf_number,
        }
    }
}

/// The public face of a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub qf_number: u32,
}

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

/// An address-book entry owned by one user and pointing at another.
///
/// The referenced id is not validated: dangling ids and self-adds are
/// tolerated and resolved to "Unknown" at read time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Id of the user this entry points at.
    pub contact_id: Uuid,
    /// Nickname chosen by the owner.
    pub nickname: String,
    /// When the entry was (last) added; re-adding overwrites it.
    pub added_at: DateTime<Utc>,
}

/// A [`Contact`] joined against the identity map at read time.
///
/// `username` and `qf_number` are resolved live; if the referenced user does
/// not exist they render as `"Unknown"` / `null` rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactView {
    pub contact_id: Uuid,
    pub nickname: String,
    pub added_at: DateTime<Utc>,
    pub username: String,
    pub qf_number: Option<u32>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Kind of a chat.  The data model reserves room for more, but only direct
/// messages exist today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Dm,
}

/// A conversation between exactly two participants.
///
/// At most one DM chat exists for any unordered pair of user ids; the store
/// enforces this atomically on creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Opaque chat identifier (`dm_{n}`).
    pub id: ChatId,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    /// The two participants, in creation order.
    pub participants: [Uuid; 2],
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message, immutable once appended.
///
/// `sender_name` is a denormalized snapshot of the sender's username at send
/// time; it is never retroactively updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: Uuid,
    /// The chat this message belongs to.
    pub chat_id: ChatId,
    /// Asserted sender id (the relay does not verify it).
    pub sender_id: Uuid,
    /// Sender's username at send time.
    pub sender_name: String,
    /// Message body.
    pub content: String,
    /// Server-side arrival time.
    pub timestamp: DateTime<Utc>,
}
