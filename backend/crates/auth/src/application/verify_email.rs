//! Verify Email Use Case
//!
//! Consumes a verification token and stamps the account. Same single-use
//! contract as password reset: consume first, expiry second.

use std::sync::Arc;

use chrono::Utc;
use platform::client::ClientInfo;

use crate::domain::entity::{audit_event::AuditEvent, user::User};
use crate::domain::repository::{AuditRepository, OneTimeTokenRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

/// Verify email use case
pub struct VerifyEmailUseCase<R>
where
    R: UserRepository + OneTimeTokenRepository + AuditRepository,
{
    repo: Arc<R>,
}

impl<R> VerifyEmailUseCase<R>
where
    R: UserRepository + OneTimeTokenRepository + AuditRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, token: &str, client: &ClientInfo) -> AuthResult<User> {
        let now = Utc::now();

        let Some(record) = self
            .repo
            .consume_email_verification_token(token, now)
            .await?
        else {
            return Err(AuthError::InvalidVerificationToken);
        };

        if record.is_expired_at(now) {
            return Err(AuthError::ExpiredVerificationToken);
        }

        let user = self.repo.mark_email_verified(&record.user_id, now).await?;

        self.repo
            .create_audit_event(
                &AuditEvent::for_user("auth.email_verify", user.user_id)
                    .with_client(client.ip_string(), client.user_agent.clone()),
            )
            .await?;

        tracing::info!(user_id = %user.user_id, "Email verified");

        Ok(user)
    }
}
