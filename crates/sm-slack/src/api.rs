//! Slack Web API client
//!
//! Read-only Web API methods used by the tools, plus the OAuth code exchange.
//! Every call is made with the user token the client was built with.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use sm_core::SlackToken;

use crate::error::{Result, SlackError};
use crate::types::*;

/// Build the shared HTTP client used for Slack calls
pub fn build_http_client() -> Result<Client> {
    Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .user_agent(concat!("slack-mcp/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(SlackError::HttpError)
}

/// Slack Web API client
#[derive(Clone, Debug)]
pub struct SlackApiClient {
    client: Client,
    token: Option<SlackToken>,
    base_url: String,
}

impl SlackApiClient {
    /// Create a client reusing an existing HTTP client
    pub fn with_http(client: Client, token: Option<SlackToken>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Client without a token, for `oauth.v2.access`
    pub fn unauthenticated(client: Client, base_url: impl Into<String>) -> Self {
        Self::with_http(client, None, base_url)
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Add authorization header
    fn add_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }

    /// Check HTTP status and Slack's `ok` flag, then decode the body
    async fn parse<T: DeserializeOwned>(method: &str, response: Response) -> Result<T> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            warn!("Slack rate limited {} (retry after {:?}s)", method, retry_after_secs);
            return Err(SlackError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("{} failed: {} - {}", method, status, error_text);
            return Err(SlackError::ApiError(format!("{}: {}", status, error_text)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SlackError::ParseError(e.to_string()))?;

        if body.get("ok").and_then(Value::as_bool) != Some(true) {
            let code = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            debug!("{} returned error: {}", method, code);
            return Err(SlackError::ApiError(code));
        }

        serde_json::from_value(body).map_err(|e| SlackError::ParseError(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, method: &str, params: &[(&str, String)]) -> Result<T> {
        debug!("Calling Slack {}", method);
        let response = self
            .add_auth(self.client.get(self.url(method)).query(params))
            .send()
            .await
            .map_err(SlackError::HttpError)?;
        Self::parse(method, response).await
    }

    async fn post_form<T: DeserializeOwned>(&self, method: &str, form: &[(&str, &str)]) -> Result<T> {
        debug!("Calling Slack {}", method);
        let response = self
            .add_auth(self.client.post(self.url(method)).form(form))
            .send()
            .await
            .map_err(SlackError::HttpError)?;
        Self::parse(method, response).await
    }

    /// Test authentication and return the identity behind the token
    pub async fn auth_test(&self) -> Result<AuthTestResponse> {
        self.post_form("auth.test", &[]).await
    }

    /// Fetch a page of channel history
    pub async fn conversations_history(
        &self,
        channel: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<HistoryResponse> {
        let mut params = vec![("channel", channel.to_string()), ("limit", limit.to_string())];
        push_cursor(&mut params, cursor);
        self.get("conversations.history", &params).await
    }

    /// Fetch a page of replies to the thread rooted at `ts`
    pub async fn conversations_replies(
        &self,
        channel: &str,
        ts: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<HistoryResponse> {
        let mut params = vec![
            ("channel", channel.to_string()),
            ("ts", ts.to_string()),
            ("limit", limit.to_string()),
        ];
        push_cursor(&mut params, cursor);
        self.get("conversations.replies", &params).await
    }

    /// Get a page of conversations (channels)
    pub async fn conversations_list(
        &self,
        types: Option<&str>,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<ConversationsListResponse> {
        let mut params = Vec::new();
        if let Some(types) = types {
            params.push(("types", types.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        push_cursor(&mut params, cursor);
        self.get("conversations.list", &params).await
    }

    /// Get channel details
    pub async fn conversations_info(&self, channel: &str) -> Result<Value> {
        let response: ConversationInfoResponse = self
            .get("conversations.info", &[("channel", channel.to_string())])
            .await?;
        Ok(response.channel)
    }

    /// Get a page of channel member ids
    pub async fn conversations_members(
        &self,
        channel: &str,
        cursor: Option<&str>,
    ) -> Result<MembersResponse> {
        let mut params = vec![("channel", channel.to_string())];
        push_cursor(&mut params, cursor);
        self.get("conversations.members", &params).await
    }

    /// Get a page of workspace users
    pub async fn users_list(&self, limit: u32, cursor: Option<&str>) -> Result<UsersListResponse> {
        let mut params = vec![("limit", limit.to_string())];
        push_cursor(&mut params, cursor);
        self.get("users.list", &params).await
    }

    /// Get user info
    pub async fn users_info(&self, user_id: &str) -> Result<Value> {
        let response: UserInfoResponse = self
            .get("users.info", &[("user", user_id.to_string())])
            .await?;
        Ok(response.user)
    }

    /// Search messages visible to the token's user
    pub async fn search_messages(
        &self,
        query: &str,
        count: u32,
        page: u32,
    ) -> Result<SearchMessagesResponse> {
        let params = [
            ("query", query.to_string()),
            ("count", count.to_string()),
            ("page", page.to_string()),
        ];
        self.get("search.messages", &params).await
    }

    /// Exchange an OAuth authorization code for a user token
    pub async fn oauth_v2_access(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<OAuthV2AccessResponse> {
        self.post_form(
            "oauth.v2.access",
            &[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ],
        )
        .await
    }
}

fn push_cursor<'a>(params: &mut Vec<(&'a str, String)>, cursor: Option<&str>) {
    if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
        params.push(("cursor", cursor.to_string()));
    }
}
