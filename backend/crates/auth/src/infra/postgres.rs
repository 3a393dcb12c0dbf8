//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use platform::password::SecretHash;
use sqlx::PgPool;
use uuid::Uuid;

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
    ids::{EmailVerificationTokenId, PasswordResetTokenId, RefreshTokenId, UserId},
    plan_tier::PlanTier,
    user_status::UserStatus,
};
use crate::error::{AuthError, AuthResult};

/// Retention for terminal refresh-token rows, kept for rotation-chain audits
const REVOKED_TOKEN_RETENTION_DAYS: i64 = 30;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete consumed/expired single-use tokens and long-dead refresh rows.
    ///
    /// Returns (refresh, verification, reset) deletion counts. Run at
    /// startup; failures should be logged, never fatal.
    pub async fn cleanup_expired(&self) -> AuthResult<(u64, u64, u64)> {
        let now = Utc::now();
        let refresh_cutoff = now - chrono::Duration::days(REVOKED_TOKEN_RETENTION_DAYS);

        let refresh = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(refresh_cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        let verifications = sqlx::query(
            "DELETE FROM email_verification_tokens WHERE consumed_at IS NOT NULL OR expires_at < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let resets = sqlx::query(
            "DELETE FROM password_reset_tokens WHERE consumed_at IS NOT NULL OR expires_at < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::info!(
            refresh_tokens_deleted = refresh,
            verification_tokens_deleted = verifications,
            reset_tokens_deleted = resets,
            "Cleaned up expired auth tokens"
        );

        Ok((refresh, verifications, resets))
    }
}

/// Map a unique-email violation onto the domain conflict
fn map_create_user_error(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return AuthError::EmailExists;
        }
    }
    AuthError::Database(err)
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create_user(&self, user: &User, credential: &Credential) -> AuthResult<()> {
        // Both rows or neither: a user without its credential must never be
        // observable. The unique email index arbitrates concurrent signups.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                status,
                plan,
                email_verified_at,
                display_name,
                timezone,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.status.id())
        .bind(user.plan.id())
        .bind(user.email_verified_at)
        .bind(&user.display_name)
        .bind(&user.timezone)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_create_user_error)?;

        sqlx::query(
            r#"
            INSERT INTO credentials (
                user_id,
                password_hash,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(credential.user_id.as_uuid())
        .bind(credential.password_hash.as_phc_string())
        .bind(credential.created_at)
        .bind(credential.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<(User, Credential)>> {
        let row = sqlx::query_as::<_, UserCredentialRow>(
            r#"
            SELECT
                u.user_id,
                u.email,
                u.status,
                u.plan,
                u.email_verified_at,
                u.display_name,
                u.timezone,
                u.last_login_at,
                u.created_at,
                u.updated_at,
                c.password_hash,
                c.created_at AS credential_created_at,
                c.updated_at AS credential_updated_at
            FROM users u
            JOIN credentials c USING (user_id)
            WHERE u.email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_parts()).transpose()
    }

    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                email,
                status,
                plan,
                email_verified_at,
                display_name,
                timezone,
                last_login_at,
                created_at,
                updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn mark_email_verified(
        &self,
        user_id: &UserId,
        verified_at: DateTime<Utc>,
    ) -> AuthResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                email_verified_at = $2,
                status = CASE WHEN status = $3 THEN $4 ELSE status END,
                updated_at = $2
            WHERE user_id = $1
            RETURNING
                user_id,
                email,
                status,
                plan,
                email_verified_at,
                display_name,
                timezone,
                last_login_at,
                created_at,
                updated_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(verified_at)
        .bind(UserStatus::Invited.id())
        .bind(UserStatus::Active.id())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()?.ok_or_else(|| {
            AuthError::Internal("User not found for verification".to_string())
        })
    }

    async fn update_password_hash(&self, user_id: &UserId, hash: &SecretHash) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE credentials SET
                password_hash = $2,
                updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(hash.as_phc_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_last_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                last_login_at = $2,
                updated_at = $2
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

impl RefreshTokenRepository for PgAuthRepository {
    async fn save_refresh_token(&self, token: &RefreshToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (
                token_id,
                user_id,
                secret_hash,
                issued_at,
                expires_at,
                revoked_at,
                replaced_by_token_id,
                client_ip,
                user_agent
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(token.token_id.as_uuid())
        .bind(token.user_id.as_uuid())
        .bind(token.secret_hash.as_phc_string())
        .bind(token.issued_at)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .bind(token.replaced_by_token_id.map(|id| *id.as_uuid()))
        .bind(&token.client_ip)
        .bind(&token.user_agent)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_refresh_token_by_id(
        &self,
        token_id: &RefreshTokenId,
    ) -> AuthResult<Option<(RefreshToken, User)>> {
        let row = sqlx::query_as::<_, RefreshTokenUserRow>(
            r#"
            SELECT
                rt.token_id,
                rt.user_id,
                rt.secret_hash,
                rt.issued_at,
                rt.expires_at,
                rt.revoked_at,
                rt.replaced_by_token_id,
                rt.client_ip,
                rt.user_agent,
                u.email,
                u.status,
                u.plan,
                u.email_verified_at,
                u.display_name,
                u.timezone,
                u.last_login_at,
                u.created_at,
                u.updated_at
            FROM refresh_tokens rt
            JOIN users u USING (user_id)
            WHERE rt.token_id = $1
            "#,
        )
        .bind(token_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_parts()).transpose()
    }

    async fn revoke_refresh_token(
        &self,
        token_id: &RefreshTokenId,
        revoked_at: DateTime<Utc>,
        replaced_by: Option<RefreshTokenId>,
    ) -> AuthResult<bool> {
        // Single conditional update: under concurrent rotation attempts
        // exactly one caller observes rows_affected == 1
        let updated = sqlx::query(
            r#"
            UPDATE refresh_tokens SET
                revoked_at = $2,
                replaced_by_token_id = $3
            WHERE token_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(token_id.as_uuid())
        .bind(revoked_at)
        .bind(replaced_by.map(|id| *id.as_uuid()))
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn revoke_refresh_tokens_for_user(
        &self,
        user_id: &UserId,
        revoked_at: DateTime<Utc>,
    ) -> AuthResult<u64> {
        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens SET
                revoked_at = $2
            WHERE user_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(revoked_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(revoked)
    }
}

// ============================================================================
// One-Time Token Repository Implementation
// ============================================================================

impl OneTimeTokenRepository for PgAuthRepository {
    async fn save_email_verification_token(
        &self,
        token: &EmailVerificationToken,
    ) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO email_verification_tokens (
                id,
                user_id,
                token,
                expires_at,
                consumed_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id.as_uuid())
        .bind(token.user_id.as_uuid())
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.consumed_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn consume_email_verification_token(
        &self,
        token: &str,
        consumed_at: DateTime<Utc>,
    ) -> AuthResult<Option<EmailVerificationToken>> {
        // Consume-if-unconsumed in one statement; expiry is the caller's
        // check, made on the returned record
        let row = sqlx::query_as::<_, OneTimeTokenRow>(
            r#"
            UPDATE email_verification_tokens SET
                consumed_at = $2
            WHERE token = $1 AND consumed_at IS NULL
            RETURNING id, user_id, token, expires_at, consumed_at, created_at
            "#,
        )
        .bind(token)
        .bind(consumed_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_verification()))
    }

    async fn create_password_reset_token(&self, token: &PasswordResetToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (
                id,
                user_id,
                token,
                expires_at,
                consumed_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id.as_uuid())
        .bind(token.user_id.as_uuid())
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.consumed_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn consume_password_reset_token(
        &self,
        token: &str,
        consumed_at: DateTime<Utc>,
    ) -> AuthResult<Option<PasswordResetToken>> {
        let row = sqlx::query_as::<_, OneTimeTokenRow>(
            r#"
            UPDATE password_reset_tokens SET
                consumed_at = $2
            WHERE token = $1 AND consumed_at IS NULL
            RETURNING id, user_id, token, expires_at, consumed_at, created_at
            "#,
        )
        .bind(token)
        .bind(consumed_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_reset()))
    }
}

// ============================================================================
// Audit Repository Implementation
// ============================================================================

impl AuditRepository for PgAuthRepository {
    async fn create_audit_event(&self, event: &AuditEvent) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_events (
                event_id,
                action,
                actor,
                user_id,
                client_ip,
                user_agent,
                metadata,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.event_id.as_uuid())
        .bind(&event.action)
        .bind(&event.actor)
        .bind(event.user_id.map(|id| *id.as_uuid()))
        .bind(&event.client_ip)
        .bind(&event.user_agent)
        .bind(&event.metadata)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    status: i16,
    plan: i16,
    email_verified_at: Option<DateTime<Utc>>,
    display_name: Option<String>,
    timezone: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let status = UserStatus::from_id(self.status)
            .ok_or_else(|| AuthError::Internal(format!("Unknown user status: {}", self.status)))?;
        let plan = PlanTier::from_id(self.plan)
            .ok_or_else(|| AuthError::Internal(format!("Unknown plan tier: {}", self.plan)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            status,
            plan,
            email_verified_at: self.email_verified_at,
            display_name: self.display_name,
            timezone: self.timezone,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserCredentialRow {
    user_id: Uuid,
    email: String,
    status: i16,
    plan: i16,
    email_verified_at: Option<DateTime<Utc>>,
    display_name: Option<String>,
    timezone: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    password_hash: String,
    credential_created_at: DateTime<Utc>,
    credential_updated_at: DateTime<Utc>,
}

impl UserCredentialRow {
    fn into_parts(self) -> AuthResult<(User, Credential)> {
        let password_hash = SecretHash::from_phc_string(self.password_hash)
            .map_err(|_| AuthError::Internal("Invalid password hash in database".to_string()))?;

        let credential = Credential {
            user_id: UserId::from_uuid(self.user_id),
            password_hash,
            created_at: self.credential_created_at,
            updated_at: self.credential_updated_at,
        };

        let user = UserRow {
            user_id: self.user_id,
            email: self.email,
            status: self.status,
            plan: self.plan,
            email_verified_at: self.email_verified_at,
            display_name: self.display_name,
            timezone: self.timezone,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_user()?;

        Ok((user, credential))
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenUserRow {
    token_id: Uuid,
    user_id: Uuid,
    secret_hash: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    replaced_by_token_id: Option<Uuid>,
    client_ip: Option<String>,
    user_agent: Option<String>,
    email: String,
    status: i16,
    plan: i16,
    email_verified_at: Option<DateTime<Utc>>,
    display_name: Option<String>,
    timezone: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RefreshTokenUserRow {
    fn into_parts(self) -> AuthResult<(RefreshToken, User)> {
        let secret_hash = SecretHash::from_phc_string(self.secret_hash)
            .map_err(|_| AuthError::Internal("Invalid secret hash in database".to_string()))?;

        let token = RefreshToken {
            token_id: RefreshTokenId::from_uuid(self.token_id),
            user_id: UserId::from_uuid(self.user_id),
            secret_hash,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            revoked_at: self.revoked_at,
            replaced_by_token_id: self.replaced_by_token_id.map(RefreshTokenId::from_uuid),
            client_ip: self.client_ip,
            user_agent: self.user_agent,
        };

        let user = UserRow {
            user_id: self.user_id,
            email: self.email,
            status: self.status,
            plan: self.plan,
            email_verified_at: self.email_verified_at,
            display_name: self.display_name,
            timezone: self.timezone,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_user()?;

        Ok((token, user))
    }
}

#[derive(sqlx::FromRow)]
struct OneTimeTokenRow {
    id: Uuid,
    user_id: Uuid,
    token: String,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl OneTimeTokenRow {
    fn into_verification(self) -> EmailVerificationToken {
        EmailVerificationToken {
            id: EmailVerificationTokenId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            token: self.token,
            expires_at: self.expires_at,
            consumed_at: self.consumed_at,
            created_at: self.created_at,
        }
    }

    fn into_reset(self) -> PasswordResetToken {
        PasswordResetToken {
            id: PasswordResetTokenId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            token: self.token,
            expires_at: self.expires_at,
            consumed_at: self.consumed_at,
            created_at: self.created_at,
        }
    }
}
