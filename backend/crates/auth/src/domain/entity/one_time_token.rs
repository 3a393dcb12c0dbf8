//! Single-Use Token Entities
//!
//! Email-verification and password-reset grants. Both are opaque random
//! strings (not `id.secret` composites), time-boxed, and consumable at most
//! once. Consumption is an atomic consume-if-unconsumed at the repository;
//! expiry is checked again at consumption time, after the consumed check.

use chrono::{DateTime, Duration, Utc};
use platform::crypto::random_token;

use crate::domain::value_object::ids::{EmailVerificationTokenId, PasswordResetTokenId, UserId};

/// Entropy of the opaque token string in bytes
const TOKEN_ENTROPY_BYTES: usize = 32;

/// Email verification token
#[derive(Debug, Clone)]
pub struct EmailVerificationToken {
    pub id: EmailVerificationTokenId,
    pub user_id: UserId,
    /// Opaque token string sent to the user's mailbox
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Set exactly once, by the consuming call
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl EmailVerificationToken {
    /// Issue a fresh token for `user_id` valid for `ttl`
    pub fn issue(user_id: UserId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: EmailVerificationTokenId::new(),
            user_id,
            token: random_token(TOKEN_ENTROPY_BYTES),
            expires_at: now + ttl,
            consumed_at: None,
            created_at: now,
        }
    }

    /// Check if the token is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Password reset token
///
/// Same shape as the verification token but a much shorter TTL (minutes,
/// not hours) and a separate store, so one kind can never consume the other.
#[derive(Debug, Clone)]
pub struct PasswordResetToken {
    pub id: PasswordResetTokenId,
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Issue a fresh token for `user_id` valid for `ttl`
    pub fn issue(user_id: UserId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: PasswordResetTokenId::new(),
            user_id,
            token: random_token(TOKEN_ENTROPY_BYTES),
            expires_at: now + ttl,
            consumed_at: None,
            created_at: now,
        }
    }

    /// Check if the token is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_generates_distinct_tokens() {
        let user_id = UserId::new();
        let a = EmailVerificationToken::issue(user_id, Duration::hours(24));
        let b = EmailVerificationToken::issue(user_id, Duration::hours(24));
        assert_ne!(a.token, b.token);
        assert!(a.consumed_at.is_none());
    }

    #[test]
    fn test_token_string_is_opaque() {
        let token = PasswordResetToken::issue(UserId::new(), Duration::minutes(30));
        // Not a composite: no dot separator, URL-safe alphabet
        assert!(!token.token.contains('.'));
        assert!(token.token.len() >= 40);
    }

    #[test]
    fn test_expiry() {
        let token = EmailVerificationToken::issue(UserId::new(), Duration::hours(1));
        assert!(!token.is_expired_at(Utc::now()));
        assert!(token.is_expired_at(Utc::now() + Duration::hours(2)));
        assert!(token.is_expired_at(token.expires_at));
    }
}
