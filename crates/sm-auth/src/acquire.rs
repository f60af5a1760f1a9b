//! Per-request Slack client acquisition
//!
//! The only way tool code obtains a Slack client. The caller's identity comes
//! from the session binding recorded at OAuth time, never from tool arguments.

use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, warn};

use sm_core::{AuthDenial, OAuthConfig, RequestContext, SessionStore};
use sm_slack::SlackApiClient;

use crate::validator::{AuthTestValidator, ExpiryValidator, TokenValidator};

/// Slack client acting as the user bound to the requesting session
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    pub user_id: String,
    pub client: SlackApiClient,
}

/// Resolves a [`RequestContext`] to an [`AuthenticatedClient`]
#[derive(Clone)]
pub struct ClientAcquirer {
    store: Arc<SessionStore>,
    http: Client,
    api_base_url: String,
    validator: Arc<dyn TokenValidator>,
}

impl ClientAcquirer {
    pub fn new(store: Arc<SessionStore>, http: Client, api_base_url: impl Into<String>) -> Self {
        Self {
            store,
            http,
            api_base_url: api_base_url.into(),
            validator: Arc::new(ExpiryValidator),
        }
    }

    /// Build from OAuth settings, verifying tokens with `auth.test` when enabled
    pub fn from_config(config: &OAuthConfig, store: Arc<SessionStore>, http: Client) -> Self {
        let acquirer = Self::new(store, http, config.api_base_url.clone());
        if config.verify_with_auth_test {
            acquirer.with_validator(Arc::new(AuthTestValidator))
        } else {
            acquirer
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn TokenValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Client for the user bound to the request's session.
    ///
    /// Fails closed: any missing piece of the chain is a denial.
    pub async fn acquire(&self, ctx: &RequestContext) -> Result<AuthenticatedClient, AuthDenial> {
        let session_id = ctx.session_id().ok_or(AuthDenial::NoSession)?;

        let user_id = self
            .store
            .lookup_user_for_session(session_id)
            .ok_or(AuthDenial::SessionUnbound)?;

        let credential = self
            .store
            .get_validated_credential(&user_id, Some(session_id))
            .ok_or_else(|| {
                warn!(request_id = %ctx.request_id(), "Session bound but no credential available");
                AuthDenial::SessionUnbound
            })?;

        let client = SlackApiClient::with_http(
            self.http.clone(),
            Some(credential.token.clone()),
            self.api_base_url.as_str(),
        );

        self.validator
            .validate(&user_id, &credential, &client)
            .await
            .map_err(|reason| {
                warn!(user_id = %user_id, request_id = %ctx.request_id(), "Rejected stored token: {}", reason);
                AuthDenial::InvalidToken(reason)
            })?;

        debug!(user_id = %user_id, request_id = %ctx.request_id(), "Acquired Slack client");
        Ok(AuthenticatedClient { user_id, client })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use sm_core::CredentialRecord;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn acquirer(store: Arc<SessionStore>) -> ClientAcquirer {
        ClientAcquirer::new(store, Client::new(), "http://127.0.0.1:9")
    }

    #[tokio::test]
    async fn test_no_session_is_denied() {
        let store = Arc::new(SessionStore::new());
        store.bind_and_store("U_ALICE", "xoxp-alice", Some("s1")).unwrap();

        let denial = acquirer(store).acquire(&RequestContext::anonymous()).await.unwrap_err();
        assert_eq!(denial, AuthDenial::NoSession);
    }

    #[tokio::test]
    async fn test_unbound_session_is_denied() {
        let store = Arc::new(SessionStore::new());
        store.bind_and_store("U_ALICE", "xoxp-alice", Some("s1")).unwrap();

        let denial = acquirer(store)
            .acquire(&RequestContext::with_session("s2"))
            .await
            .unwrap_err();
        assert_eq!(denial, AuthDenial::SessionUnbound);
    }

    #[tokio::test]
    async fn test_each_session_gets_its_own_user() {
        let store = Arc::new(SessionStore::new());
        store.bind_and_store("U_ALICE", "xoxp-alice", Some("s1")).unwrap();
        store.bind_and_store("U_BOB", "xoxp-bob", Some("s2")).unwrap();
        let acquirer = acquirer(store);

        let alice = acquirer.acquire(&RequestContext::with_session("s1")).await.unwrap();
        let bob = acquirer.acquire(&RequestContext::with_session("s2")).await.unwrap();
        assert_eq!(alice.user_id, "U_ALICE");
        assert_eq!(bob.user_id, "U_BOB");
    }

    #[tokio::test]
    async fn test_expired_token_is_invalid() {
        let store = Arc::new(SessionStore::new());
        let record = CredentialRecord::new("xoxp-alice").with_expiry(Utc::now() - Duration::seconds(5));
        store.bind_and_store("U_ALICE", record, Some("s1")).unwrap();

        let denial = acquirer(store)
            .acquire(&RequestContext::with_session("s1"))
            .await
            .unwrap_err();
        assert_eq!(denial, AuthDenial::InvalidToken("token expired".to_string()));
    }

    #[tokio::test]
    async fn test_custom_validator_sees_bound_user() {
        struct OnlyAlice;

        #[async_trait]
        impl TokenValidator for OnlyAlice {
            async fn validate(
                &self,
                user_id: &str,
                _credential: &CredentialRecord,
                _client: &SlackApiClient,
            ) -> Result<(), String> {
                if user_id == "U_ALICE" { Ok(()) } else { Err("not alice".to_string()) }
            }
        }

        let store = Arc::new(SessionStore::new());
        store.bind_and_store("U_ALICE", "xoxp-alice", Some("s1")).unwrap();
        store.bind_and_store("U_BOB", "xoxp-bob", Some("s2")).unwrap();
        let acquirer = acquirer(store).with_validator(Arc::new(OnlyAlice));

        assert!(acquirer.acquire(&RequestContext::with_session("s1")).await.is_ok());
        assert_eq!(
            acquirer.acquire(&RequestContext::with_session("s2")).await.unwrap_err(),
            AuthDenial::InvalidToken("not alice".to_string())
        );
    }

    #[tokio::test]
    async fn test_from_config_enables_auth_test() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth.test"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"ok": false, "error": "token_revoked"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(SessionStore::new());
        store.bind_and_store("U_ALICE", "xoxp-alice", Some("s1")).unwrap();

        let config = OAuthConfig {
            api_base_url: server.uri(),
            verify_with_auth_test: true,
            ..OAuthConfig::default()
        };
        let acquirer = ClientAcquirer::from_config(&config, store, Client::new());

        let denial = acquirer.acquire(&RequestContext::with_session("s1")).await.unwrap_err();
        assert_eq!(denial, AuthDenial::InvalidToken("token_revoked".to_string()));
    }
}
