//! Error types for sm-core

use thiserror::Error;

/// Main error type for sm-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the session binding store.
///
/// Only `bind_and_store` produces these; every read on the store is total.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session is already bound to someone else. The other identity is
    /// deliberately not part of the error.
    #[error("session {session_id} is already bound to a different user")]
    BindingConflict { session_id: String },

    #[error("user id must not be empty")]
    EmptyUserId,
}

impl SessionError {
    /// True for the binding-conflict kind
    pub fn is_conflict(&self) -> bool {
        matches!(self, SessionError::BindingConflict { .. })
    }
}

/// Result type alias for sm-core
pub type Result<T> = std::result::Result<T, Error>;
