//! Refresh Token Entity
//!
//! A rotating session grant. Each record is a small state machine:
//!
//! ```text
//! active -> rotated  (revoked with replaced_by_token_id set)
//!        -> revoked  (explicit logout, password reset, defense)
//!        -> expired  (time-based, detected lazily and then closed out)
//! ```
//!
//! All non-active states are terminal; a token is never resurrected. The
//! record stores only the hash of the secret half of the composite token;
//! the `token_id` is the plaintext lookup key.

use chrono::{DateTime, Utc};
use platform::password::SecretHash;

use crate::domain::value_object::ids::{RefreshTokenId, UserId};

/// Refresh token entity
#[derive(Debug, Clone)]
pub struct RefreshToken {
    /// Public identifier half of the composite token
    pub token_id: RefreshTokenId,
    /// Owning user
    pub user_id: UserId,
    /// Argon2id hash of the secret half; the secret itself is never stored
    pub secret_hash: SecretHash,
    /// Issued timestamp
    pub issued_at: DateTime<Utc>,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
    /// When the token left the active state; None while active
    pub revoked_at: Option<DateTime<Utc>>,
    /// Successor token when rotated; forms the auditable rotation chain
    pub replaced_by_token_id: Option<RefreshTokenId>,
    /// Client IP at issuance (audit only)
    pub client_ip: Option<String>,
    /// User agent at issuance (audit only)
    pub user_agent: Option<String>,
}

impl RefreshToken {
    /// Create a new active token
    pub fn new(
        token_id: RefreshTokenId,
        user_id: UserId,
        secret_hash: SecretHash,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        client_ip: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            token_id,
            user_id,
            secret_hash,
            issued_at,
            expires_at,
            revoked_at: None,
            replaced_by_token_id: None,
            client_ip,
            user_agent,
        }
    }

    /// Check if the token has been revoked or rotated
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Check if the token is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Usable: not revoked and not expired
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }
}
