//! sm-core: core library for the Slack MCP server
//!
//! Configuration, the session-to-user binding store, per-request context and
//! the tool system shared by the other crates.

pub mod config;
pub mod context;
pub mod error;
pub mod session;
pub mod tool;

pub use config::{Config, OAuthConfig, ServerConfig, SessionConfig};
pub use context::{RequestContext, SESSION_HEADER};
pub use error::{Error, Result, SessionError};
pub use session::{BindOutcome, CredentialRecord, SessionStore, SlackToken};
pub use tool::{
    AuthDenial, SchemaBuilder, Tool, ToolDefinition, ToolError, ToolManager, ToolOutcome, ToolResult,
    error_payload,
};
