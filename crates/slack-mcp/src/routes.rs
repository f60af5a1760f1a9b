//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{health, oauth_callback};
use crate::mcp::{end_session, handle_mcp};
use crate::server::AppState;

/// Create the router. The OAuth callback lives at the configured redirect path.
pub fn routes(redirect_path: &str) -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // MCP JSON-RPC endpoint
        .route("/mcp", post(handle_mcp).delete(end_session))
        // Slack OAuth redirect
        .route(redirect_path, get(oauth_callback))
}
