//! Identity operations: signup, login, lookup by QfChat number.

use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::User;
use crate::store::ChatStore;

impl ChatStore {
    /// Register a new user.
    ///
    /// Fails with [`StoreError::DuplicateUsername`] if any existing user has
    /// the same username (exact, case-sensitive match); a failed signup
    /// mutates nothing.  On success a fresh id and a unique QfChat number are
    /// allocated and the user's contact map is initialized empty.
    pub async fn signup(&self, username: &str, password: &str) -> Result<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == username) {
            return Err(StoreError::DuplicateUsername);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_owned(),
            password: password.to_owned(),
            qf_number: allocate_qf_number(&state.users),
            created_at: Utc::now(),
        };

        state.users.insert(user.id, user.clone());
        state.contacts.entry(user.id).or_default();

        info!(user = %user.id, username, qf_number = user.qf_number, "User signed up");
        Ok(user)
    }

    /// Authenticate a user.
    ///
    /// Succeeds only on an exact match of both username and password.  The
    /// comparison is plaintext, preserved verbatim from the original design.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let state = self.state.read().await;
        state
            .users
            .values()
            .find(|u| u.username == username && u.password == password)
            .cloned()
            .ok_or(StoreError::InvalidCredentials)
    }

    /// Look up a user by their QfChat number.
    pub async fn find_by_qf_number(&self, qf_number: u32) -> Result<User> {
        let state = self.state.read().await;
        state
            .users
            .values()
            .find(|u| u.qf_number == qf_number)
            .cloned()
            .ok_or(StoreError::UserNotFound)
    }

    /// Fetch a user by id.  `None` for unknown ids.
    pub async fn get_user(&self, id: Uuid) -> Option<User> {
        self.state.read().await.users.get(&id).cloned()
    }
}

/// Pick a random six-digit QfChat number not held by any existing user.
///
/// Runs under the store's write lock, so the uniqueness check cannot race
/// with a concurrent signup.
fn allocate_qf_number(users: &HashMap<Uuid, User>) -> u32 {
    let mut rng = rand::thread_rng();
    loop {
        let candidate = rng.gen_range(100_000..=999_999);
        if !users.values().any(|u| u.qf_number == candidate) {
            return candidate;
        }
    }
}
