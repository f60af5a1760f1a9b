//! Slack OAuth handshake
//!
//! Issues authorization URLs tied to a session through a one-time `state`
//! nonce, and on callback exchanges the code for a user token and binds it to
//! that session in the [`SessionStore`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use sm_core::{BindOutcome, Config, CredentialRecord, OAuthConfig, SessionStore};
use sm_slack::SlackApiClient;

use crate::error::{AuthError, Result};

/// Session waiting for its OAuth callback
#[derive(Debug, Clone)]
struct PendingAuthorization {
    session_id: String,
    issued_at: DateTime<Utc>,
}

/// Result of a completed authorization
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    pub user_id: String,
    pub team_id: Option<String>,
    pub session_id: String,
    pub outcome: BindOutcome,
}

/// Performs the OAuth handshake and records the resulting binding
pub struct OAuthHandler {
    config: OAuthConfig,
    redirect_uri: String,
    store: Arc<SessionStore>,
    http: Client,
    /// state nonce -> pending authorization
    pending: Mutex<HashMap<String, PendingAuthorization>>,
    state_ttl: Duration,
}

impl OAuthHandler {
    pub fn new(config: &Config, store: Arc<SessionStore>, http: Client) -> Self {
        let state_ttl = i64::try_from(config.oauth.state_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::minutes(10));

        Self {
            config: config.oauth.clone(),
            redirect_uri: config.redirect_uri(),
            store,
            http,
            pending: Mutex::new(HashMap::new()),
            state_ttl,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingAuthorization>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Slack authorize URL carrying `state`
    pub fn build_authorization_url(&self, state: &str) -> Result<Url> {
        if self.config.client_id.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        let mut url = Url::parse(&self.config.authorize_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("user_scope", &self.config.scopes.join(","))
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("state", state);
        Ok(url)
    }

    /// Register a one-time state for `session_id` and return the URL the
    /// user should open to authorize this session.
    ///
    /// A session holds at most one live state. Asking again while it is
    /// pending returns the same URL and restarts its expiry.
    pub fn authorization_url(&self, session_id: &str) -> Result<String> {
        if session_id.is_empty() {
            return Err(AuthError::EmptySession);
        }

        let mut pending = self.pending();
        let now = Utc::now();
        pending.retain(|_, p| now - p.issued_at < self.state_ttl);

        if let Some((state, existing)) = pending.iter_mut().find(|(_, p)| p.session_id == session_id) {
            existing.issued_at = now;
            return Ok(self.build_authorization_url(state)?.into());
        }

        let state = uuid::Uuid::new_v4().simple().to_string();
        let url = self.build_authorization_url(&state)?;
        pending.insert(
            state,
            PendingAuthorization {
                session_id: session_id.to_string(),
                issued_at: now,
            },
        );

        Ok(url.into())
    }

    /// Consume `state`, returning its session if it was issued and has not expired
    fn take_pending(&self, state: &str) -> Option<String> {
        let pending = self.pending().remove(state)?;
        if Utc::now() - pending.issued_at >= self.state_ttl {
            return None;
        }
        Some(pending.session_id)
    }

    /// Number of authorizations waiting for a callback
    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    /// Exchange `code` from the callback and bind the resulting user to the
    /// session that requested `state`.
    ///
    /// The state is consumed even when the exchange fails.
    pub async fn exchange_code(&self, code: &str, state: &str) -> Result<AuthorizedUser> {
        if !self.is_configured() {
            return Err(AuthError::NotConfigured);
        }

        let session_id = self.take_pending(state).ok_or_else(|| {
            warn!("OAuth callback with unknown or expired state");
            AuthError::InvalidState
        })?;

        let api = SlackApiClient::unauthenticated(self.http.clone(), &self.config.api_base_url);
        let response = api
            .oauth_v2_access(
                &self.config.client_id,
                &self.config.client_secret,
                code,
                &self.redirect_uri,
            )
            .await?;

        let user = response.authed_user;
        let token = user
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let team_id = response.team.map(|t| t.id);
        let scopes = user
            .scope
            .as_deref()
            .map(|s| s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        let mut record = CredentialRecord::new(token).with_scopes(scopes);
        if let Some(team) = &team_id {
            record = record.with_team(team.clone());
        }
        if let Some(expires_at) = user
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        {
            record = record.with_expiry(expires_at);
        }

        let outcome = self
            .store
            .bind_and_store(&user.id, record, Some(&session_id))
            .inspect_err(|_| warn!(session_id = %session_id, "OAuth completed for a session owned by another user"))?;

        info!(user_id = %user.id, session_id = %session_id, "Slack OAuth completed");

        Ok(AuthorizedUser {
            user_id: user.id,
            team_id,
            session_id,
            outcome,
        })
    }
}
