//! Tool failure taxonomy

use thiserror::Error;

/// Why a request was not given an authenticated Slack client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthDenial {
    #[error("No session: this request did not carry a session id")]
    NoSession,

    #[error("Session is not authenticated with Slack")]
    SessionUnbound,

    #[error("Slack token is invalid or expired: {0}")]
    InvalidToken(String),
}

impl AuthDenial {
    /// Stable identifier used in tool output
    pub fn code(&self) -> &'static str {
        match self {
            AuthDenial::NoSession => "no_session",
            AuthDenial::SessionUnbound => "session_unbound",
            AuthDenial::InvalidToken(_) => "invalid_token",
        }
    }
}

/// Failure of a single tool call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// The session may not act on Slack right now
    #[error("{0}")]
    Unauthorized(AuthDenial),

    /// Arguments were missing or malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    /// Slack or the network failed
    #[error("Slack API error: {message}")]
    Upstream {
        message: String,
        /// Present when Slack asked us to back off
        retry_after_secs: Option<u64>,
    },
}

impl ToolError {
    /// Stable error kind string
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Unauthorized(_) => "unauthorized",
            ToolError::InvalidInput(_) => "invalid_input",
            ToolError::NotFound(_) => "not_found",
            ToolError::Upstream { .. } => "upstream",
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        ToolError::Upstream {
            message: message.into(),
            retry_after_secs: None,
        }
    }

    /// Whether retrying the same call later can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ToolError::Upstream { .. })
    }
}

impl From<AuthDenial> for ToolError {
    fn from(denial: AuthDenial) -> Self {
        ToolError::Unauthorized(denial)
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ToolError::from(AuthDenial::NoSession).kind(), "unauthorized");
        assert_eq!(ToolError::InvalidInput("x".into()).kind(), "invalid_input");
        assert_eq!(ToolError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(ToolError::upstream("boom").kind(), "upstream");
    }

    #[test]
    fn test_retryable() {
        assert!(ToolError::upstream("ratelimited").is_retryable());
        assert!(!ToolError::Unauthorized(AuthDenial::SessionUnbound).is_retryable());
        assert!(!ToolError::InvalidInput("bad".into()).is_retryable());
    }

    #[test]
    fn test_denial_codes() {
        assert_eq!(AuthDenial::NoSession.code(), "no_session");
        assert_eq!(AuthDenial::SessionUnbound.code(), "session_unbound");
        assert_eq!(AuthDenial::InvalidToken("revoked".into()).code(), "invalid_token");
        assert!(AuthDenial::InvalidToken("revoked".into()).to_string().contains("revoked"));
    }
}
