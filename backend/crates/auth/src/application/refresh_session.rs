//! Refresh Session Use Case
//!
//! The most safety-critical transition: rotates a refresh token into a new
//! pair. Every rejection path below step 2 leaves the presented token
//! revoked before the failure is reported, so a failed refresh never leaves
//! a retryable target behind.

use std::sync::Arc;

use chrono::Utc;
use platform::client::ClientInfo;
use platform::password::Secret;
use serde_json::json;

use crate::application::config::AuthConfig;
use crate::application::issue_session::{IssuedSession, issue_session};
use crate::application::tokens::{self, TokenCodec};
use crate::domain::entity::{audit_event::AuditEvent, user::User};
use crate::domain::repository::{AuditRepository, RefreshTokenRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

/// Refresh input
pub struct RefreshSessionInput {
    /// Composite `id.secret` token from body or cookie
    pub refresh_token: String,
    pub client: ClientInfo,
}

/// Refresh output
#[derive(Debug)]
pub struct RefreshSessionOutput {
    pub user: User,
    pub session: IssuedSession,
}

/// Refresh session use case
pub struct RefreshSessionUseCase<R>
where
    R: UserRepository + RefreshTokenRepository + AuditRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> RefreshSessionUseCase<R>
where
    R: UserRepository + RefreshTokenRepository + AuditRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: RefreshSessionInput) -> AuthResult<RefreshSessionOutput> {
        // Strict parse: refresh does not tolerate malformed tokens
        let Some((token_id, secret)) = tokens::parse_refresh(&input.refresh_token) else {
            return Err(AuthError::InvalidRefreshToken);
        };

        let Some((record, user)) = self.repo.find_refresh_token_by_id(&token_id).await? else {
            return Err(AuthError::InvalidRefreshToken);
        };

        // Replay detection: a rotated-away token presented again means the
        // composite leaked or the client is badly broken. Reject outright.
        if record.is_revoked() {
            tracing::warn!(
                token_id = %token_id,
                user_id = %record.user_id,
                "Revoked refresh token replayed"
            );
            return Err(AuthError::RefreshTokenRevoked);
        }

        let now = Utc::now();

        // Close out an expired-but-not-yet-revoked record before failing
        if record.is_expired_at(now) {
            self.repo
                .revoke_refresh_token(&token_id, now, None)
                .await?;
            return Err(AuthError::RefreshTokenExpired);
        }

        // A wrong secret against a valid-looking id smells like guessing;
        // revoking denies any future use of that id
        if !record.secret_hash.verify(&Secret::new(secret)) {
            self.repo
                .revoke_refresh_token(&token_id, now, None)
                .await?;
            tracing::warn!(
                token_id = %token_id,
                "Refresh token secret mismatch"
            );
            return Err(AuthError::InvalidRefreshToken);
        }

        if user.is_suspended() {
            self.repo
                .revoke_refresh_token(&token_id, now, None)
                .await?;
            return Err(AuthError::AccountSuspended);
        }

        // Rotate: new pair first, then the conditional revoke links old to
        // new. Refresh carries no remember-me, so the lifetime ceiling
        // applies to the successor.
        let codec = TokenCodec::new(&self.config);
        let session = issue_session(
            self.repo.as_ref(),
            &self.config,
            &codec,
            &user,
            false,
            Some(token_id),
            &input.client,
        )
        .await?;

        self.repo
            .create_audit_event(
                &AuditEvent::for_user("auth.refresh", user.user_id)
                    .with_client(input.client.ip_string(), input.client.user_agent.clone())
                    .with_metadata(json!({ "rotatedTokenId": token_id.to_string() })),
            )
            .await?;

        tracing::debug!(
            user_id = %user.user_id,
            old_token_id = %token_id,
            new_token_id = %session.refresh_token_id,
            "Refresh token rotated"
        );

        Ok(RefreshSessionOutput { user, session })
    }
}
