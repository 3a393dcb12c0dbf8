//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer. All cross-request state goes through these traits;
//! use cases hold nothing mutable across await points.

use chrono::{DateTime, Utc};
use platform::password::SecretHash;

use crate::domain::entity::{
    audit_event::AuditEvent,
    credential::Credential,
    one_time_token::{EmailVerificationToken, PasswordResetToken},
    refresh_token::RefreshToken,
    user::User,
};
use crate::domain::value_object::{
    email::Email,
    ids::{RefreshTokenId, UserId},
};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a user together with its credential.
    ///
    /// Both writes succeed or neither is observable; a duplicate normalized
    /// email must fail with `AuthError::EmailExists`. The unique-email
    /// constraint here is the source of truth for signup races - callers may
    /// pre-check existence, but only as an optimization.
    async fn create_user(&self, user: &User, credential: &Credential) -> AuthResult<()>;

    /// Find a user by normalized email, with its credential
    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<(User, Credential)>>;

    /// Find a user by ID
    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Set the email-verified timestamp (promoting Invited to Active) and
    /// return the updated user
    async fn mark_email_verified(
        &self,
        user_id: &UserId,
        verified_at: DateTime<Utc>,
    ) -> AuthResult<User>;

    /// Replace the stored password hash
    async fn update_password_hash(&self, user_id: &UserId, hash: &SecretHash) -> AuthResult<()>;

    /// Record a successful login time
    async fn update_last_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()>;
}

/// Refresh token repository trait
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    /// Persist a freshly issued token
    async fn save_refresh_token(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Find a token by its public id, joined with the owning user
    async fn find_refresh_token_by_id(
        &self,
        token_id: &RefreshTokenId,
    ) -> AuthResult<Option<(RefreshToken, User)>>;

    /// Revoke a token, optionally linking its successor.
    ///
    /// Must be a single conditional update gated on `revoked_at IS NULL`.
    /// Returns `true` only for the call that performed the transition;
    /// concurrent racers observe `false` and must treat the token as
    /// already revoked. This is the atomicity the rotation race relies on.
    async fn revoke_refresh_token(
        &self,
        token_id: &RefreshTokenId,
        revoked_at: DateTime<Utc>,
        replaced_by: Option<RefreshTokenId>,
    ) -> AuthResult<bool>;

    /// Revoke every active token of a user (password reset). Returns the
    /// number of tokens revoked.
    async fn revoke_refresh_tokens_for_user(
        &self,
        user_id: &UserId,
        revoked_at: DateTime<Utc>,
    ) -> AuthResult<u64>;
}

/// Single-use token repository trait
#[trait_variant::make(OneTimeTokenRepository: Send)]
pub trait LocalOneTimeTokenRepository {
    /// Persist an email verification token
    async fn save_email_verification_token(
        &self,
        token: &EmailVerificationToken,
    ) -> AuthResult<()>;

    /// Atomically consume a verification token: set `consumed_at` iff it is
    /// currently null, returning the consumed record. `None` means the token
    /// is unknown or was already consumed; callers cannot tell the two apart.
    /// Expiry is NOT checked here; the caller checks it on the returned
    /// record, after consumption.
    async fn consume_email_verification_token(
        &self,
        token: &str,
        consumed_at: DateTime<Utc>,
    ) -> AuthResult<Option<EmailVerificationToken>>;

    /// Persist a password reset token
    async fn create_password_reset_token(&self, token: &PasswordResetToken) -> AuthResult<()>;

    /// Atomically consume a reset token; same contract as the verification
    /// variant
    async fn consume_password_reset_token(
        &self,
        token: &str,
        consumed_at: DateTime<Utc>,
    ) -> AuthResult<Option<PasswordResetToken>>;
}

/// Audit repository trait
#[trait_variant::make(AuditRepository: Send)]
pub trait LocalAuditRepository {
    /// Append an audit event
    async fn create_audit_event(&self, event: &AuditEvent) -> AuthResult<()>;
}
