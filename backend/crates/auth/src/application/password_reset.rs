//! Password Reset Use Case
//!
//! Two halves: requesting a reset token and redeeming it. The request half
//! answers identically whether or not the account exists; the redeem half
//! revokes every live session of the account, since a leaked password makes
//! all of them suspect.

use std::sync::Arc;

use chrono::Utc;
use platform::client::ClientInfo;
use platform::password::Secret;
use serde_json::json;

use crate::application::config::AuthConfig;
use crate::domain::entity::{
    audit_event::AuditEvent, one_time_token::PasswordResetToken, user::User,
};
use crate::domain::notifier::{Notifier, PasswordResetEmail};
use crate::domain::repository::{
    AuditRepository, OneTimeTokenRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Password reset use case (request + redeem)
pub struct PasswordResetUseCase<R, N>
where
    R: UserRepository + RefreshTokenRepository + OneTimeTokenRepository + AuditRepository,
    N: Notifier,
{
    repo: Arc<R>,
    notifier: Arc<N>,
    config: Arc<AuthConfig>,
}

impl<R, N> PasswordResetUseCase<R, N>
where
    R: UserRepository + RefreshTokenRepository + OneTimeTokenRepository + AuditRepository,
    N: Notifier,
{
    pub fn new(repo: Arc<R>, notifier: Arc<N>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    /// Request a reset token for `email`.
    ///
    /// The outward result is identical whether the account exists or not;
    /// only an existing account gets a token, an audit entry, and an email.
    pub async fn request(&self, email: &str, client: &ClientInfo) -> AuthResult<()> {
        // A malformed email cannot belong to an account; same outward result
        let Ok(email) = Email::new(email) else {
            return Ok(());
        };

        let Some((user, _credential)) = self.repo.find_user_by_email(&email).await? else {
            return Ok(());
        };

        let reset_ttl = chrono::Duration::from_std(self.config.reset_token_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid reset TTL: {e}")))?;
        let token = PasswordResetToken::issue(user.user_id, reset_ttl);
        self.repo.create_password_reset_token(&token).await?;

        self.repo
            .create_audit_event(
                &AuditEvent::for_user("auth.password_reset_request", user.user_id)
                    .with_client(client.ip_string(), client.user_agent.clone()),
            )
            .await?;

        if let Err(e) = self
            .notifier
            .send_password_reset_email(PasswordResetEmail {
                to: user.email.clone(),
                display_name: user.display_name.clone(),
                token: token.token.clone(),
                expires_at: token.expires_at,
            })
            .await
        {
            tracing::warn!(
                user_id = %user.user_id,
                error = %e,
                "Password reset email delivery failed"
            );
        }

        tracing::info!(user_id = %user.user_id, "Password reset requested");
        Ok(())
    }

    /// Redeem a reset token and set a new password.
    ///
    /// The consume is atomic: unknown and already-consumed tokens are
    /// indistinguishable. Expiry is checked after consumption, so an expired
    /// token is burned by the attempt - consumed-before-expired ordering is
    /// deliberate and matches the token store contract.
    pub async fn reset(
        &self,
        token: &str,
        new_password: String,
        client: &ClientInfo,
    ) -> AuthResult<User> {
        let now = Utc::now();

        let Some(record) = self.repo.consume_password_reset_token(token, now).await? else {
            return Err(AuthError::InvalidResetToken);
        };

        if record.is_expired_at(now) {
            return Err(AuthError::ResetTokenExpired);
        }

        // Defensive: unreachable under referential integrity
        let Some(user) = self.repo.find_user_by_id(&record.user_id).await? else {
            return Err(AuthError::ResetUnknownUser);
        };

        let new_hash = Secret::new(new_password)
            .hash()
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        self.repo
            .update_password_hash(&user.user_id, &new_hash)
            .await?;

        // All prior sessions are suspect once the password was reset
        let revoked = self
            .repo
            .revoke_refresh_tokens_for_user(&user.user_id, now)
            .await?;

        self.repo
            .create_audit_event(
                &AuditEvent::for_user("auth.password_reset", user.user_id)
                    .with_client(client.ip_string(), client.user_agent.clone())
                    .with_metadata(json!({ "sessionsRevoked": revoked })),
            )
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            sessions_revoked = revoked,
            "Password reset completed"
        );

        Ok(user)
    }
}
