//! Token validation before a client is handed out

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use sm_core::CredentialRecord;
use sm_slack::SlackApiClient;

/// Decides whether a stored credential may still be used for `user_id`.
///
/// `Err` carries a short reason that never includes the token.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(
        &self,
        user_id: &str,
        credential: &CredentialRecord,
        client: &SlackApiClient,
    ) -> Result<(), String>;
}

/// Rejects credentials whose recorded expiry has passed. Makes no network calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpiryValidator;

fn check_expiry(credential: &CredentialRecord) -> Result<(), String> {
    if credential.token.is_empty() {
        return Err("empty token".to_string());
    }
    if credential.is_expired_at(Utc::now()) {
        return Err("token expired".to_string());
    }
    Ok(())
}

#[async_trait]
impl TokenValidator for ExpiryValidator {
    async fn validate(
        &self,
        _user_id: &str,
        credential: &CredentialRecord,
        _client: &SlackApiClient,
    ) -> Result<(), String> {
        check_expiry(credential)
    }
}

/// Expiry check followed by `auth.test`, which must report the same user.
///
/// Any failure of the call itself also rejects the credential.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthTestValidator;

#[async_trait]
impl TokenValidator for AuthTestValidator {
    async fn validate(
        &self,
        user_id: &str,
        credential: &CredentialRecord,
        client: &SlackApiClient,
    ) -> Result<(), String> {
        check_expiry(credential)?;

        let identity = client.auth_test().await.map_err(|e| {
            debug!(user_id = %user_id, "auth.test failed: {}", e);
            match e.api_code() {
                Some(code) => code.to_string(),
                None => "token verification failed".to_string(),
            }
        })?;

        if identity.user_id != user_id {
            return Err("token belongs to a different user".to_string());
        }
        Ok(())
    }
}
