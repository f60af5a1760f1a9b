//! slack-mcp: multi-user Slack MCP server
//!
//! Usage:
//!   slack-mcp                  - Start the server
//!   slack-mcp --config <path>  - Start with an explicit TOML config
//!   slack-mcp --help           - Show help

mod error;
mod handlers;
mod mcp;
mod routes;
mod server;

use std::sync::Arc;
use std::time::Duration;

use sm_core::{Config, SessionStore};
use sm_slack::build_http_client;
use tracing_subscriber::EnvFilter;

use crate::server::AppState;

/// Run mode
enum RunMode {
    Server { config_path: Option<String> },
    Help,
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = match parse_args()? {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("slack-mcp {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server { config_path } => config_path,
    };

    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = match &config_path {
        Some(path) => Config::from_toml_file(path),
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting slack-mcp {}...", env!("CARGO_PKG_VERSION"));
    if !config.oauth.is_configured() {
        tracing::warn!("SLACK_CLIENT_ID / SLACK_CLIENT_SECRET not set; sessions cannot authenticate");
    }

    let session_ttl = config.session.ttl();
    let store = Arc::new(SessionStore::with_ttl(session_ttl));

    let sweeper = match session_ttl {
        Some(ttl) => {
            tracing::info!("Session bindings expire after {}s", ttl.num_seconds());
            Some(Arc::clone(&store).start_sweeper(Duration::from_secs(config.session.sweep_interval_secs)))
        }
        None => {
            tracing::info!("Session bindings last for the process lifetime");
            None
        }
    };

    let http = build_http_client().map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
    let state = AppState::new(config, store, http);

    server::start_server(state, shutdown_signal()).await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Parse command line arguments
fn parse_args() -> anyhow::Result<RunMode> {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                config_path = Some(path);
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    Ok(RunMode::Server { config_path })
}

/// Print help message
fn print_help() {
    println!("slack-mcp - multi-user Slack MCP server");
    println!();
    println!("Usage:");
    println!("  slack-mcp                  Start the server");
    println!("  slack-mcp --config <path>  Load settings from a TOML file");
    println!("  slack-mcp --help           Show this help message");
    println!("  slack-mcp --version        Show version");
    println!();
    println!("Environment Variables:");
    println!("  SLACK_CLIENT_ID             Slack app client id (required for OAuth)");
    println!("  SLACK_CLIENT_SECRET         Slack app client secret (required for OAuth)");
    println!("  SLACK_MCP_HOST              Bind address (default: 0.0.0.0)");
    println!("  SLACK_MCP_PORT              Port (default: 8001)");
    println!("  SLACK_MCP_BASE_URI          Public base URI for the redirect (default: http://localhost)");
    println!("  SLACK_MCP_SCOPES            Comma separated user scopes");
    println!("  SLACK_MCP_VERIFY_TOKENS     Verify tokens with auth.test before each call");
    println!("  SLACK_MCP_SESSION_TTL_SECS  Session binding lifetime, 0 = unlimited (default: 0)");
    println!("  SLACK_API_BASE_URL          Slack Web API base (default: https://slack.com/api)");
    println!("  RUST_LOG                    Log filter (default: info)");
}

/// Resolves on Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
