//! Tracing-Backed Notifier
//!
//! Stand-in delivery channel: logs the send instead of talking to a mail
//! provider. Token values are never logged; in development the raw token is
//! available through the debug_tokens response field instead.

use crate::domain::notifier::{Notifier, PasswordResetEmail, VerificationEmail};
use crate::error::AuthResult;

/// Notifier that logs deliveries via `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    async fn send_verification_email(&self, mail: VerificationEmail) -> AuthResult<()> {
        tracing::info!(
            to = %mail.to,
            expires_at = %mail.expires_at,
            "Would send verification email"
        );
        Ok(())
    }

    async fn send_password_reset_email(&self, mail: PasswordResetEmail) -> AuthResult<()> {
        tracing::info!(
            to = %mail.to,
            expires_at = %mail.expires_at,
            "Would send password reset email"
        );
        Ok(())
    }
}
