//! Slack API types
//!
//! Message, user and channel objects are kept as raw JSON so tools can hand
//! Slack's full payload back to the agent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response metadata (pagination)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Cursor for the next page, `None` when Slack reports no more pages
pub fn next_cursor(metadata: &Option<ResponseMetadata>) -> Option<String> {
    metadata
        .as_ref()
        .and_then(|m| m.next_cursor.clone())
        .filter(|c| !c.is_empty())
}

/// conversations.history / conversations.replies response
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

/// conversations.list response
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationsListResponse {
    #[serde(default)]
    pub channels: Vec<Value>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

/// conversations.info response
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationInfoResponse {
    #[serde(default)]
    pub channel: Value,
}

/// conversations.members response
#[derive(Debug, Clone, Deserialize)]
pub struct MembersResponse {
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

/// users.list response
#[derive(Debug, Clone, Deserialize)]
pub struct UsersListResponse {
    #[serde(default)]
    pub members: Vec<Value>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

/// users.info response
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoResponse {
    #[serde(default)]
    pub user: Value,
}

/// search.messages response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchMessagesResponse {
    #[serde(default)]
    pub messages: SearchMessages,
}

/// Matches block of a search.messages response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchMessages {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub matches: Vec<Value>,
    #[serde(default)]
    pub pagination: Option<SearchPagination>,
    #[serde(default)]
    pub paging: Option<SearchPaging>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPagination {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPaging {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub pages: Option<u32>,
}

impl SearchMessages {
    /// Current page (1 when Slack omits it)
    pub fn page(&self) -> u32 {
        self.pagination
            .as_ref()
            .and_then(|p| p.page)
            .or_else(|| self.paging.as_ref().and_then(|p| p.page))
            .unwrap_or(1)
    }

    /// Total pages (1 when Slack omits it)
    pub fn page_count(&self) -> u32 {
        self.pagination
            .as_ref()
            .and_then(|p| p.page_count)
            .or_else(|| self.paging.as_ref().and_then(|p| p.pages))
            .unwrap_or(1)
    }
}

/// auth.test response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTestResponse {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    pub user_id: String,
}

/// oauth.v2.access response (user-token install)
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthV2AccessResponse {
    pub authed_user: AuthedUser,
    #[serde(default)]
    pub team: Option<OAuthTeam>,
}

/// The user who approved the install
#[derive(Clone, Deserialize)]
pub struct AuthedUser {
    pub id: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Present when token rotation is enabled
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for AuthedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthedUser")
            .field("id", &self.id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTeam {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_next_cursor_empty_is_none() {
        let meta = Some(ResponseMetadata {
            next_cursor: Some(String::new()),
        });
        assert_eq!(next_cursor(&meta), None);

        let meta = Some(ResponseMetadata {
            next_cursor: Some("dXNlcjpVMEc5V0ZYTlo=".to_string()),
        });
        assert_eq!(next_cursor(&meta).as_deref(), Some("dXNlcjpVMEc5V0ZYTlo="));
        assert_eq!(next_cursor(&None), None);
    }

    #[test]
    fn test_search_paging_fallbacks() {
        let parsed: SearchMessagesResponse = serde_json::from_value(json!({
            "messages": {
                "total": 42,
                "matches": [{"ts": "1.0"}],
                "paging": {"count": 20, "total": 42, "page": 2, "pages": 3}
            }
        }))
        .unwrap();
        assert_eq!(parsed.messages.total, 42);
        assert_eq!(parsed.messages.page(), 2);
        assert_eq!(parsed.messages.page_count(), 3);

        let empty: SearchMessagesResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.messages.page(), 1);
        assert_eq!(empty.messages.page_count(), 1);
        assert!(empty.messages.matches.is_empty());
    }

    #[test]
    fn test_authed_user_debug_redacts_token() {
        let user: AuthedUser = serde_json::from_value(json!({
            "id": "U1",
            "access_token": "xoxp-secret",
            "token_type": "user"
        }))
        .unwrap();
        assert!(!format!("{:?}", user).contains("xoxp-secret"));
    }
}
