//! Per-request context
//!
//! The server builds one `RequestContext` per inbound call and passes it down
//! to the tool being executed.

/// HTTP header carrying the session id issued by the server
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Request-scoped values handed to every tool call
#[derive(Debug, Clone)]
pub struct RequestContext {
    session_id: Option<String>,
    request_id: String,
}

impl RequestContext {
    /// Create a context for the given session. Empty ids count as no session.
    pub fn new(session_id: Option<String>) -> Self {
        Self {
            session_id: session_id.filter(|s| !s.trim().is_empty()),
            request_id: uuid::Uuid::now_v7().to_string(),
        }
    }

    /// Context for a request that carried no session
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn with_session(session_id: impl Into<String>) -> Self {
        Self::new(Some(session_id.into()))
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Unique id for log correlation
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_session_is_none() {
        assert!(RequestContext::new(Some(String::new())).session_id().is_none());
        assert!(RequestContext::new(Some("  ".to_string())).session_id().is_none());
        assert!(RequestContext::anonymous().session_id().is_none());
    }

    #[test]
    fn test_session_and_request_ids() {
        let a = RequestContext::with_session("abc");
        let b = RequestContext::with_session("abc");
        assert_eq!(a.session_id(), Some("abc"));
        assert_ne!(a.request_id(), b.request_id());
    }
}
