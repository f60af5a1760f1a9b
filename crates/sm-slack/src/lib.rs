//! sm-slack: Slack Web API client
//!
//! Thin async wrapper over the Slack Web API methods the tools need. Each
//! client is bound to one user token obtained through OAuth.

pub mod api;
pub mod error;
pub mod types;

pub use api::{SlackApiClient, build_http_client};
pub use error::{Result, SlackError};
