//! API DTOs (Data Transfer Objects)
//!
//! Password policy and other request-shape rules are enforced here, at the
//! validation boundary, before a use case runs.

use chrono::{DateTime, Utc};
use platform::password::validate_password_policy;
use serde::{Deserialize, Serialize};

use crate::application::issue_session::IssuedSession;
use crate::domain::entity::user::User;
use crate::error::AuthResult;

// ============================================================================
// Sign Up
// ============================================================================

/// Sign up request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    /// Missing flag reads as not accepted
    #[serde(default)]
    pub accept_terms: bool,
    pub display_name: Option<String>,
    pub timezone: Option<String>,
}

impl SignUpRequest {
    pub fn validate(&self) -> AuthResult<()> {
        validate_password_policy(&self.password)?;
        Ok(())
    }
}

/// Sign up response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub user: UserDto,
    pub session: SessionDto,
    pub requires_email_verification: bool,
    /// Raw verification token, present only outside production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
}

// ============================================================================
// Sign In
// ============================================================================

/// Sign in request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Sign in response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub user: UserDto,
    pub session: SessionDto,
    pub email_verified: bool,
}

// ============================================================================
// Refresh / Logout
// ============================================================================

/// Refresh request; the token may instead arrive via the refresh cookie
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Refresh response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub user: UserDto,
    pub session: SessionDto,
}

/// Logout request; token may also come from the refresh cookie
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOutRequest {
    pub refresh_token: Option<String>,
}

// ============================================================================
// Password Reset / Email Verification
// ============================================================================

/// Password reset request (step 1)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequestRequest {
    pub email: String,
}

/// Password reset request acknowledgement; identical whether or not the
/// email exists
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequestedResponse {
    pub requested: bool,
}

/// Password reset redemption (step 2)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> AuthResult<()> {
        validate_password_policy(&self.new_password)?;
        Ok(())
    }
}

/// Email verification request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// Bare user response (reset, verify)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user: UserDto,
}

// ============================================================================
// Shared payloads
// ============================================================================

/// User payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub status: String,
    pub plan: String,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub timezone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            email: user.email.to_string(),
            status: user.status.code().to_string(),
            plan: user.plan.code().to_string(),
            email_verified: user.email_verified(),
            display_name: user.display_name.clone(),
            timezone: user.timezone.clone(),
            created_at: user.created_at,
        }
    }
}

/// Token pair payload; the two always travel together
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl From<&IssuedSession> for SessionDto {
    fn from(session: &IssuedSession) -> Self {
        Self {
            access_token: session.access_token.clone(),
            access_token_expires_at: session.access_expires_at,
            refresh_token: session.refresh_token.clone(),
            refresh_token_expires_at: session.refresh_expires_at,
        }
    }
}
