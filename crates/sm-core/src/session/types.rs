//! Session binding types

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroize;

/// Slack OAuth token material.
///
/// The value never shows up in `Debug` output and is wiped from memory when
/// dropped. Call [`SlackToken::expose`] only where the token is handed to Slack.
#[derive(Clone, PartialEq, Eq)]
pub struct SlackToken(String);

impl SlackToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token string
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SlackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SlackToken(<redacted>)")
    }
}

impl Drop for SlackToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl From<String> for SlackToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SlackToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Stored credential for one Slack user
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    /// User OAuth token (xoxp-...)
    pub token: SlackToken,
    /// Workspace the token was issued for
    pub team_id: Option<String>,
    /// Granted user scopes
    pub scopes: Vec<String>,
    /// Set when Slack token rotation is enabled
    pub expires_at: Option<DateTime<Utc>>,
    /// When this record was written
    pub stored_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Create a record holding only a token
    pub fn new(token: impl Into<SlackToken>) -> Self {
        Self {
            token: token.into(),
            team_id: None,
            scopes: Vec::new(),
            expires_at: None,
            stored_at: Utc::now(),
        }
    }

    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the token is past its expiry at `now`.
    /// Tokens without an expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl From<SlackToken> for CredentialRecord {
    fn from(token: SlackToken) -> Self {
        Self::new(token)
    }
}

impl From<&str> for CredentialRecord {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for CredentialRecord {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

/// Association of one session with the user who first authenticated under it
#[derive(Debug, Clone)]
pub struct Binding {
    pub user_id: String,
    pub bound_at: DateTime<Utc>,
}

/// What a successful `bind_and_store` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// A new session binding was created
    Bound,
    /// The session was already bound to this user; only the credential changed
    Refreshed,
    /// No session id was supplied; the credential was stored without a binding
    Unbound,
}
