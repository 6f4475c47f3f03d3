use thiserror::Error;

/// Errors produced by the store layer.
///
/// All of these are handled-path domain failures: the API layer renders them
/// as `{success: false, message}` with a 200 status, never as a transport
/// failure.  The display strings are the messages clients see.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// Signup with a username that already exists (case-sensitive match).
    #[error("Username already exists")]
    DuplicateUsername,

    /// Login where username/password did not both match exactly.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No user carries the requested QfChat number.
    #[error("User not found")]
    UserNotFound,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
