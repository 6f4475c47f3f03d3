//! # qfchat-store
//!
//! In-memory domain state for the QfChat server: users, contacts, chats and
//! message logs.  The crate exposes a cloneable [`ChatStore`] handle that owns
//! all four maps behind a single `tokio::sync::RwLock`, so every operation --
//! including the search-then-insert step of DM deduplication -- runs as one
//! logical transaction.
//!
//! State lives for the lifetime of the process.  There is no persistence; a
//! durable backend can later be swapped in behind the same operations without
//! touching the wire protocol.

pub mod models;
pub mod store;

mod chats;
mod contacts;
mod error;
mod messages;
mod users;

pub use error::StoreError;
pub use models::*;
pub use store::ChatStore;
