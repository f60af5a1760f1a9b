//! Slack OAuth and per-session client acquisition for slack-mcp

pub mod acquire;
pub mod error;
pub mod oauth;
pub mod validator;

pub use acquire::{AuthenticatedClient, ClientAcquirer};
pub use error::{AuthError, Result};
pub use oauth::{AuthorizedUser, OAuthHandler};
pub use validator::{AuthTestValidator, ExpiryValidator, TokenValidator};
