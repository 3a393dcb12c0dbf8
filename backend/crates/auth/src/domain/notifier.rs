//! Notification Sender Trait
//!
//! Outbound email is an external collaborator. The session service calls
//! these methods after the relevant state is committed and treats failures
//! as the collaborator's problem: logged, never retried, never surfaced to
//! the caller of signup or reset-request.

use chrono::{DateTime, Utc};

use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Payload for a verification email
#[derive(Debug, Clone)]
pub struct VerificationEmail {
    pub to: Email,
    pub display_name: Option<String>,
    /// Raw single-use token to embed in the verification link
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Payload for a password reset email
#[derive(Debug, Clone)]
pub struct PasswordResetEmail {
    pub to: Email,
    pub display_name: Option<String>,
    /// Raw single-use token to embed in the reset link
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Notification sender trait
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    /// Deliver a verification email
    async fn send_verification_email(&self, mail: VerificationEmail) -> AuthResult<()>;

    /// Deliver a password reset email
    async fn send_password_reset_email(&self, mail: PasswordResetEmail) -> AuthResult<()>;
}
