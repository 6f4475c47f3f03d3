//! Contact book operations.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Contact, ContactView};
use crate::store::ChatStore;

impl ChatStore {
    /// Upsert a contact entry.
    ///
    /// Re-adding the same contact overwrites the nickname and refreshes
    /// `added_at` (last-write-wins).  Neither the contact id's existence nor
    /// `owner != contact_id` is validated; dangling ids and self-adds are
    /// tolerated and resolved at read time.  Callers substitute their own
    /// fallback for an empty nickname.
    pub async fn add_contact(&self, owner: Uuid, contact_id: Uuid, nickname: &str) -> Contact {
        let mut state = self.state.write().await;

        let contact = Contact {
            contact_id,
            nickname: nickname.to_owned(),
            added_at: Utc::now(),
        };
        state
            .contacts
            .entry(owner)
            .or_default()
            .insert(contact_id, contact.clone());

        debug!(%owner, contact = %contact_id, nickname, "Contact added");
        contact
    }

    /// List a user's contacts with username/QfChat number resolved live
    /// against the identity map.
    ///
    /// Entries pointing at unknown users render `username = "Unknown"` and
    /// `qf_number = None` instead of failing.  Unknown owners yield an empty
    /// list.
    pub async fn list_contacts(&self, owner: Uuid) -> Vec<ContactView> {
        let state = self.state.read().await;
        let Some(entries) = state.contacts.get(&owner) else {
            return Vec::new();
        };

        entries
            .values()
            .map(|contact| {
                let user = state.users.get(&contact.contact_id);
                ContactView {
                    contact_id: contact.contact_id,
                    nickname: contact.nickname.clone(),
                    added_at: contact.added_at,
                    username: user
                        .map(|u| u.username.clone())
                        .unwrap_or_else(|| "Unknown".to_owned()),
                    qf_number: user.map(|u| u.qf_number),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_contact_resolves_live_username() {
        let store = ChatStore::new();
        let alice = store.signup("alice", "pw").await.unwrap();
        let bob = store.signup("bob", "pw").await.unwrap();

        store.add_contact(alice.id, bob.id, "bobby").await;

        let contacts = store.list_contacts(alice.id).await;
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].nickname, "bobby");
        assert_eq!(contacts[0].username, "bob");
        assert_eq!(contacts[0].qf_number, Some(bob.qf_number));
    }

    #[tokio::test]
    async fn test_readd_overwrites_nickname() {
        let store = ChatStore::new();
        let alice = store.signup("alice", "pw").await.unwrap();
        let bob = store.signup("bob", "pw").await.unwrap();

        store.add_contact(alice.id, bob.id, "bobby").await;
        store.add_contact(alice.id, bob.id, "robert").await;

        let contacts = store.list_contacts(alice.id).await;
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].nickname, "robert");
    }

    #[tokio::test]
    async fn test_dangling_contact_renders_unknown() {
        let store = ChatStore::new();
        let alice = store.signup("alice", "pw").await.unwrap();

        store.add_contact(alice.id, Uuid::new_v4(), "ghost").await;

        let contacts = store.list_contacts(alice.id).await;
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].username, "Unknown");
        assert_eq!(contacts[0].qf_number, None);
    }

    #[tokio::test]
    async fn test_self_add_is_tolerated() {
        let store = ChatStore::new();
        let alice = store.signup("alice", "pw").await.unwrap();

        store.add_contact(alice.id, alice.id, "me").await;

        let contacts = store.list_contacts(alice.id).await;
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].username, "alice");
    }

    #[tokio::test]
    async fn test_unknown_owner_yields_empty_list() {
        let store = ChatStore::new();
        assert!(store.list_contacts(Uuid::new_v4()).await.is_empty());
    }
}
