//! In-Memory Repository
//!
//! Mutex-guarded maps with the same semantics as the PostgreSQL adapter:
//! unique normalized emails, conditional revocation, atomic single-use
//! consumption. Backs the scenario tests and local development.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use platform::password::SecretHash;

use crate::domain::entity::{
    audit_event::AuditEvent,
    credential::Credential,
    one_time_token::{EmailVerificationToken, PasswordResetToken},
    refresh_token::RefreshToken,
    user::User,
};
use crate::domain::repository::{
    AuditRepository, OneTimeTokenRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::{
    email::Email,
    ids::{RefreshTokenId, UserId},
    user_status::UserStatus,
};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct Store {
    users: HashMap<UserId, User>,
    credentials: HashMap<UserId, Credential>,
    refresh_tokens: HashMap<RefreshTokenId, RefreshToken>,
    email_verifications: Vec<EmailVerificationToken>,
    password_resets: Vec<PasswordResetToken>,
    audit_events: Vec<AuditEvent>,
}

/// In-memory auth repository
#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    inner: Arc<Mutex<Store>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        // Never held across an await; poisoning means a panicked test
        self.inner.lock().expect("auth store mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Inspection and admin helpers (dev/test support)
    // ------------------------------------------------------------------

    /// All refresh tokens belonging to `user_id`
    pub fn refresh_tokens_for_user(&self, user_id: &UserId) -> Vec<RefreshToken> {
        self.store()
            .refresh_tokens
            .values()
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// A single refresh token by id
    pub fn refresh_token(&self, token_id: &RefreshTokenId) -> Option<RefreshToken> {
        self.store().refresh_tokens.get(token_id).cloned()
    }

    /// Verification tokens issued for `user_id`
    pub fn verification_tokens_for_user(&self, user_id: &UserId) -> Vec<EmailVerificationToken> {
        self.store()
            .email_verifications
            .iter()
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Reset tokens issued for `user_id`
    pub fn reset_tokens_for_user(&self, user_id: &UserId) -> Vec<PasswordResetToken> {
        self.store()
            .password_resets
            .iter()
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Recorded audit action names, in order
    pub fn audit_actions(&self) -> Vec<String> {
        self.store()
            .audit_events
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }

    /// Full audit log
    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.store().audit_events.clone()
    }

    /// Flip an account's status (admin-style mutation)
    pub fn set_user_status(&self, user_id: &UserId, status: UserStatus) {
        if let Some(user) = self.store().users.get_mut(user_id) {
            user.status = status;
            user.updated_at = Utc::now();
        }
    }
}

impl UserRepository for MemoryAuthRepository {
    async fn create_user(&self, user: &User, credential: &Credential) -> AuthResult<()> {
        let mut store = self.store();

        if store.users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailExists);
        }

        // Single lock acquisition stands in for the transaction: both
        // inserts become visible together
        store.users.insert(user.user_id, user.clone());
        store
            .credentials
            .insert(credential.user_id, credential.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<(User, Credential)>> {
        let store = self.store();
        let Some(user) = store.users.values().find(|u| &u.email == email) else {
            return Ok(None);
        };
        let Some(credential) = store.credentials.get(&user.user_id) else {
            return Ok(None);
        };
        Ok(Some((user.clone(), credential.clone())))
    }

    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.store().users.get(user_id).cloned())
    }

    async fn mark_email_verified(
        &self,
        user_id: &UserId,
        verified_at: DateTime<Utc>,
    ) -> AuthResult<User> {
        let mut store = self.store();
        let user = store
            .users
            .get_mut(user_id)
            .ok_or_else(|| AuthError::Internal("User not found for verification".to_string()))?;
        user.mark_email_verified(verified_at);
        Ok(user.clone())
    }

    async fn update_password_hash(&self, user_id: &UserId, hash: &SecretHash) -> AuthResult<()> {
        let mut store = self.store();
        let credential = store
            .credentials
            .get_mut(user_id)
            .ok_or_else(|| AuthError::Internal("Credential not found".to_string()))?;
        credential.update_password(hash.clone());
        Ok(())
    }

    async fn update_last_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        let mut store = self.store();
        let user = store
            .users
            .get_mut(user_id)
            .ok_or_else(|| AuthError::Internal("User not found".to_string()))?;
        user.last_login_at = Some(at);
        user.updated_at = at;
        Ok(())
    }
}

impl RefreshTokenRepository for MemoryAuthRepository {
    async fn save_refresh_token(&self, token: &RefreshToken) -> AuthResult<()> {
        self.store()
            .refresh_tokens
            .insert(token.token_id, token.clone());
        Ok(())
    }

    async fn find_refresh_token_by_id(
        &self,
        token_id: &RefreshTokenId,
    ) -> AuthResult<Option<(RefreshToken, User)>> {
        let store = self.store();
        let Some(token) = store.refresh_tokens.get(token_id) else {
            return Ok(None);
        };
        let Some(user) = store.users.get(&token.user_id) else {
            return Ok(None);
        };
        Ok(Some((token.clone(), user.clone())))
    }

    async fn revoke_refresh_token(
        &self,
        token_id: &RefreshTokenId,
        revoked_at: DateTime<Utc>,
        replaced_by: Option<RefreshTokenId>,
    ) -> AuthResult<bool> {
        let mut store = self.store();
        let Some(token) = store.refresh_tokens.get_mut(token_id) else {
            return Ok(false);
        };

        // Conditional transition: only one caller can win
        if token.revoked_at.is_some() {
            return Ok(false);
        }

        token.revoked_at = Some(revoked_at);
        token.replaced_by_token_id = replaced_by;
        Ok(true)
    }

    async fn revoke_refresh_tokens_for_user(
        &self,
        user_id: &UserId,
        revoked_at: DateTime<Utc>,
    ) -> AuthResult<u64> {
        let mut store = self.store();
        let mut revoked = 0u64;
        for token in store.refresh_tokens.values_mut() {
            if &token.user_id == user_id && token.revoked_at.is_none() {
                token.revoked_at = Some(revoked_at);
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}

impl OneTimeTokenRepository for MemoryAuthRepository {
    async fn save_email_verification_token(
        &self,
        token: &EmailVerificationToken,
    ) -> AuthResult<()> {
        self.store().email_verifications.push(token.clone());
        Ok(())
    }

    async fn consume_email_verification_token(
        &self,
        token: &str,
        consumed_at: DateTime<Utc>,
    ) -> AuthResult<Option<EmailVerificationToken>> {
        let mut store = self.store();
        let Some(record) = store
            .email_verifications
            .iter_mut()
            .find(|t| t.token == token && t.consumed_at.is_none())
        else {
            return Ok(None);
        };
        record.consumed_at = Some(consumed_at);
        Ok(Some(record.clone()))
    }

    async fn create_password_reset_token(&self, token: &PasswordResetToken) -> AuthResult<()> {
        self.store().password_resets.push(token.clone());
        Ok(())
    }

    async fn consume_password_reset_token(
        &self,
        token: &str,
        consumed_at: DateTime<Utc>,
    ) -> AuthResult<Option<PasswordResetToken>> {
        let mut store = self.store();
        let Some(record) = store
            .password_resets
            .iter_mut()
            .find(|t| t.token == token && t.consumed_at.is_none())
        else {
            return Ok(None);
        };
        record.consumed_at = Some(consumed_at);
        Ok(Some(record.clone()))
    }
}

impl AuditRepository for MemoryAuthRepository {
    async fn create_audit_event(&self, event: &AuditEvent) -> AuthResult<()> {
        self.store().audit_events.push(event.clone());
        Ok(())
    }
}
