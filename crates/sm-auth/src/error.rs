//! Error types for sm-auth

use sm_core::SessionError;
use sm_slack::SlackError;
use thiserror::Error;

/// OAuth flow errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Slack OAuth is not configured (SLACK_CLIENT_ID / SLACK_CLIENT_SECRET)")]
    NotConfigured,

    #[error("A session id is required to start authorization")]
    EmptySession,

    #[error("Unknown or expired OAuth state")]
    InvalidState,

    #[error("OAuth code exchange failed: {0}")]
    Exchange(#[from] SlackError),

    #[error("Slack did not return a user token")]
    MissingToken,

    /// The session was already claimed by another identity
    #[error("Authentication rejected: {0}")]
    Rejected(#[from] SessionError),

    #[error("Invalid authorize URL: {0}")]
    Url(#[from] url::ParseError),
}

impl AuthError {
    /// True when the store refused the binding because the session belongs to someone else
    pub fn is_conflict(&self) -> bool {
        matches!(self, AuthError::Rejected(e) if e.is_conflict())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AuthError>;
