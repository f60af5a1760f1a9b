//! HTTP server
//!
//! Starts and manages the axum-based HTTP server.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use sm_auth::{ClientAcquirer, OAuthHandler};
use sm_core::{Config, SessionStore, ToolManager};
use sm_tools::register_slack_tools;

use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<SessionStore>,
    pub oauth: Arc<OAuthHandler>,
    pub tools: Arc<ToolManager>,
}

impl AppState {
    /// Wire the OAuth handler and the Slack tools to one session store
    pub fn new(config: Config, store: Arc<SessionStore>, http: reqwest::Client) -> Self {
        let oauth = OAuthHandler::new(&config, Arc::clone(&store), http.clone());
        let acquirer = ClientAcquirer::from_config(&config.oauth, Arc::clone(&store), http);

        let mut tools = ToolManager::new();
        register_slack_tools(&mut tools, acquirer);
        info!("Registered {} tools: {:?}", tools.len(), tools.tool_names());

        Self {
            config: Arc::new(config),
            store,
            oauth: Arc::new(oauth),
            tools: Arc::new(tools),
        }
    }
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes(&state.config.oauth.redirect_path))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn start_server<F>(state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("MCP endpoint listening on http://{}/mcp", listener.local_addr()?);
    info!("OAuth redirect URI: {}", state.config.redirect_uri());

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
