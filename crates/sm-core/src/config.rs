//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. environment variables
//! 2. `slack-mcp.toml`
//! 3. defaults
//!
//! `${VAR_NAME}` inside the TOML file is replaced with the environment value.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// Default config file name looked up in the working directory
pub const CONFIG_FILE: &str = "slack-mcp.toml";

/// User scopes requested during Slack OAuth
pub const DEFAULT_USER_SCOPES: &[&str] = &[
    "channels:history",
    "channels:read",
    "groups:history",
    "groups:read",
    "im:history",
    "im:read",
    "mpim:history",
    "mpim:read",
    "users:read",
    "users:read.email",
    "search:read",
];

/// Main configuration for slack-mcp
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub oauth: OAuthConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally visible base URI, without port (used for the OAuth redirect)
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_uri: default_base_uri(),
        }
    }
}

/// Slack OAuth settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub client_id: String,

    #[serde(default, skip_serializing)]
    pub client_secret: String,

    /// User scopes requested at authorization time
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    #[serde(default = "default_redirect_path")]
    pub redirect_path: String,

    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    /// Slack Web API base (overridable for testing)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Call `auth.test` before handing out a client
    #[serde(default)]
    pub verify_with_auth_test: bool,

    /// How long an issued OAuth `state` stays redeemable
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            scopes: default_scopes(),
            redirect_path: default_redirect_path(),
            authorize_url: default_authorize_url(),
            api_base_url: default_api_base_url(),
            verify_with_auth_test: false,
            state_ttl_secs: default_state_ttl_secs(),
        }
    }
}

impl OAuthConfig {
    /// Both client credentials are present
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Session binding lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum binding age in seconds. 0 keeps bindings for the process lifetime.
    #[serde(default)]
    pub ttl_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 0,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl SessionConfig {
    /// Binding TTL, `None` when disabled
    pub fn ttl(&self) -> Option<chrono::Duration> {
        if self.ttl_secs == 0 {
            return None;
        }
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_base_uri() -> String {
    "http://localhost".to_string()
}

fn default_scopes() -> Vec<String> {
    DEFAULT_USER_SCOPES.iter().map(|s| s.to_string()).collect()
}

fn default_redirect_path() -> String {
    "/oauth2callback".to_string()
}

fn default_authorize_url() -> String {
    "https://slack.com/oauth/v2/authorize".to_string()
}

fn default_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_state_ttl_secs() -> u64 {
    600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl Config {
    /// Replace `${VAR_NAME}` with the environment value (empty when unset)
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let name = &after[..end];
                    if !name.is_empty() {
                        if let Ok(env_value) = std::env::var(name) {
                            result.push_str(&env_value);
                        }
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    // Unterminated: keep the text as written
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Parse TOML text (after `${VAR}` expansion)
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded = Self::expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;

        let mut cfg = Self::from_toml_str(&content)?;
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `slack-mcp.toml` from the working directory if present,
    /// otherwise defaults plus environment.
    pub fn load() -> crate::Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_toml_file(CONFIG_FILE);
        }
        Self::from_env()
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = get("SLACK_CLIENT_ID") {
            self.oauth.client_id = id;
        }
        if let Some(secret) = get("SLACK_CLIENT_SECRET") {
            self.oauth.client_secret = secret;
        }
        if let Some(scopes) = get("SLACK_MCP_SCOPES") {
            self.oauth.scopes = scopes
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(url) = get("SLACK_API_BASE_URL") {
            self.oauth.api_base_url = url;
        }
        if let Some(verify) = get("SLACK_MCP_VERIFY_TOKENS") {
            self.oauth.verify_with_auth_test = parse_bool(&verify);
        }

        if let Some(host) = get("SLACK_MCP_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("SLACK_MCP_PORT") {
            if let Ok(p) = port.trim().parse() {
                self.server.port = p;
            }
        }
        if let Some(uri) = get("SLACK_MCP_BASE_URI") {
            self.server.base_uri = uri;
        }

        if let Some(ttl) = get("SLACK_MCP_SESSION_TTL_SECS") {
            if let Ok(secs) = ttl.trim().parse() {
                self.session.ttl_secs = secs;
            }
        }
    }

    fn validate(&self) -> crate::Result<()> {
        if !self.oauth.redirect_path.starts_with('/') {
            return Err(Error::Config(format!(
                "oauth.redirect_path must start with '/': {}",
                self.oauth.redirect_path
            )));
        }
        if self.session.sweep_interval_secs == 0 {
            return Err(Error::Config(
                "session.sweep_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// OAuth redirect URI registered with Slack
    pub fn redirect_uri(&self) -> String {
        format!(
            "{}:{}{}",
            self.server.base_uri.trim_end_matches('/'),
            self.server.port,
            self.oauth.redirect_path
        )
    }
}
