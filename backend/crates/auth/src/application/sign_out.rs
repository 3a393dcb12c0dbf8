//! Sign Out Use Case
//!
//! Revokes the presented refresh token. Logout never fails the caller:
//! missing or malformed tokens are silent no-ops, and repository errors are
//! logged and swallowed. Cookie possession is the transport-level proof of
//! ownership, so no secret verification happens here.

use std::sync::Arc;

use chrono::Utc;

use crate::application::tokens;
use crate::domain::entity::audit_event::AuditEvent;
use crate::domain::repository::{AuditRepository, RefreshTokenRepository};

/// Sign out use case
pub struct SignOutUseCase<R>
where
    R: RefreshTokenRepository + AuditRepository,
{
    repo: Arc<R>,
}

impl<R> SignOutUseCase<R>
where
    R: RefreshTokenRepository + AuditRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Revoke the token if one was presented and parses; otherwise do
    /// nothing at all.
    pub async fn execute(&self, refresh_token: Option<&str>) {
        let Some(raw) = refresh_token else {
            return;
        };

        // Tolerant parse: garbage is treated like no token
        let Some((token_id, _secret)) = tokens::parse_refresh(raw) else {
            return;
        };

        let now = Utc::now();
        if let Err(e) = self.repo.revoke_refresh_token(&token_id, now, None).await {
            tracing::warn!(
                token_id = %token_id,
                error = %e,
                "Failed to revoke refresh token on logout"
            );
            return;
        }

        // No owner lookup on logout, so the event carries no user id
        let event = AuditEvent::system("auth.logout");
        if let Err(e) = self.repo.create_audit_event(&event).await {
            tracing::warn!(error = %e, "Failed to record logout audit event");
        }

        tracing::info!(token_id = %token_id, "User signed out");
    }
}
