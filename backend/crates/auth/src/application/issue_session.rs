//! Session Issuance
//!
//! Shared by signup, login, and refresh: every successful authentication
//! hands out an access/refresh pair together, never one half alone.

use chrono::{DateTime, Utc};
use platform::client::ClientInfo;
use platform::password::Secret;

use crate::application::config::AuthConfig;
use crate::application::tokens::{self, TokenCodec};
use crate::domain::entity::refresh_token::RefreshToken;
use crate::domain::entity::user::User;
use crate::domain::repository::RefreshTokenRepository;
use crate::domain::value_object::ids::RefreshTokenId;
use crate::error::{AuthError, AuthResult};

/// A freshly issued access/refresh pair with absolute expiries
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    /// Composite `id.secret` string; the only time the secret exists in
    /// clear text outside the client
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
    pub refresh_token_id: RefreshTokenId,
}

/// Issue a new session for `user`.
///
/// When `rotated_from` is set, the predecessor token is revoked and linked
/// to the new one. The conditional revoke decides races between concurrent
/// refreshes of the same token: the loser withdraws its own freshly saved
/// token and reports the replay, so at most one live successor exists.
pub(crate) async fn issue_session<R>(
    repo: &R,
    config: &AuthConfig,
    codec: &TokenCodec,
    user: &User,
    remember_me: bool,
    rotated_from: Option<RefreshTokenId>,
    client: &ClientInfo,
) -> AuthResult<IssuedSession>
where
    R: RefreshTokenRepository,
{
    let now = Utc::now();

    let access_ttl = chrono::Duration::from_std(config.access_token_ttl)
        .map_err(|e| AuthError::Internal(format!("Invalid access token TTL: {e}")))?;
    let refresh_ttl = chrono::Duration::from_std(config.effective_refresh_ttl(remember_me))
        .map_err(|e| AuthError::Internal(format!("Invalid refresh token TTL: {e}")))?;

    let access_expires_at = now + access_ttl;
    let refresh_expires_at = now + refresh_ttl;

    let minted = tokens::mint_refresh();
    let secret_hash = Secret::new(minted.secret.as_str())
        .hash()
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let record = RefreshToken::new(
        minted.token_id,
        user.user_id,
        secret_hash,
        now,
        refresh_expires_at,
        client.ip_string(),
        client.user_agent.clone(),
    );

    repo.save_refresh_token(&record).await?;

    if let Some(old_id) = rotated_from {
        let won = repo
            .revoke_refresh_token(&old_id, now, Some(minted.token_id))
            .await?;

        if !won {
            // A concurrent refresh rotated the old token first. Withdraw the
            // token we just saved and surface the replay.
            if let Err(e) = repo.revoke_refresh_token(&minted.token_id, now, None).await {
                tracing::warn!(
                    token_id = %minted.token_id,
                    error = %e,
                    "Failed to withdraw refresh token after losing rotation race"
                );
            }
            tracing::warn!(
                token_id = %old_id,
                "Concurrent rotation detected on refresh token"
            );
            return Err(AuthError::RefreshTokenRevoked);
        }
    }

    let access_token = codec.sign_access(user, access_expires_at)?;

    Ok(IssuedSession {
        access_token,
        access_expires_at,
        refresh_token: minted.composite(),
        refresh_expires_at,
        refresh_token_id: minted.token_id,
    })
}
