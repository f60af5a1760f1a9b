//! Error types for sm-slack

use sm_core::ToolError;
use thiserror::Error;

/// sm-slack error type
#[derive(Error, Debug)]
pub enum SlackError {
    /// Slack answered `ok: false`
    #[error("Slack API error: {0}")]
    ApiError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited by Slack")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SlackError {
    /// Slack error code when Slack itself rejected the call
    pub fn api_code(&self) -> Option<&str> {
        match self {
            SlackError::ApiError(code) => Some(code),
            _ => None,
        }
    }
}

impl From<SlackError> for ToolError {
    fn from(err: SlackError) -> Self {
        match err {
            SlackError::RateLimited { retry_after_secs } => ToolError::Upstream {
                message: "ratelimited".to_string(),
                retry_after_secs,
            },
            SlackError::ApiError(code) => ToolError::upstream(code),
            other => ToolError::upstream(other.to_string()),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SlackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_maps_to_retryable_upstream() {
        let err: ToolError = SlackError::RateLimited {
            retry_after_secs: Some(12),
        }
        .into();
        assert_eq!(
            err,
            ToolError::Upstream {
                message: "ratelimited".to_string(),
                retry_after_secs: Some(12)
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_api_error_keeps_slack_code() {
        let err = SlackError::ApiError("channel_not_found".to_string());
        assert_eq!(err.api_code(), Some("channel_not_found"));

        let tool_err: ToolError = err.into();
        assert_eq!(tool_err.to_string(), "Slack API error: channel_not_found");
    }
}
