//! HTTP error responses for slack-mcp

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use sm_auth::AuthError;
use thiserror::Error;
use tracing::warn;

/// Errors surfaced by the HTTP handlers
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Auth(e) => match e {
                AuthError::InvalidState | AuthError::EmptySession => StatusCode::BAD_REQUEST,
                AuthError::Rejected(_) => StatusCode::CONFLICT,
                AuthError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                AuthError::Exchange(_) | AuthError::MissingToken | AuthError::Url(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ServerError::Auth(e) if e.is_conflict() => {
                "Authentication rejected: this session is already signed in as a different Slack user."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!("{} {}", status, self);
        (status, self.message()).into_response()
    }
}
