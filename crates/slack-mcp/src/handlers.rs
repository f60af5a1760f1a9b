//! HTTP handlers for health and the OAuth callback

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ServerError;
use crate::server::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub oauth_configured: bool,
    pub sessions: usize,
    pub users: usize,
    /// OAuth handshakes waiting for their callback
    pub pending_authorizations: usize,
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        oauth_configured: state.oauth.is_configured(),
        sessions: state.store.session_count(),
        users: state.store.user_count(),
        pending_authorizations: state.oauth.pending_count(),
    })
}

/// Query string Slack sends to the redirect URI
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Set when the user declined
    #[serde(default)]
    pub error: Option<String>,
}

/// Complete the OAuth handshake and bind the user to the waiting session
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<String, ServerError> {
    if let Some(error) = params.error {
        return Err(ServerError::BadRequest(format!("Authorization failed: {}", error)));
    }

    let (Some(code), Some(oauth_state)) = (
        params.code.filter(|c| !c.is_empty()),
        params.state.filter(|s| !s.is_empty()),
    ) else {
        return Err(ServerError::BadRequest(
            "Missing code or state parameter".to_string(),
        ));
    };

    let authorized = state.oauth.exchange_code(&code, &oauth_state).await?;
    info!(user_id = %authorized.user_id, outcome = ?authorized.outcome, "OAuth callback completed");

    Ok(format!(
        "Authenticated as Slack user {}. You can close this window and return to your MCP client.",
        authorized.user_id
    ))
}
