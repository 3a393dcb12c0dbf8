//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system. Every variant carries
//! a stable machine-readable code for API clients; HTTP status and message
//! wording may change, codes may not.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::PasswordPolicyError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// An account with this email already exists
    #[error("An account with this email already exists")]
    EmailExists,

    /// Terms of service were not accepted
    #[error("You must accept the terms of service")]
    TermsNotAccepted,

    /// Invalid credentials. Deliberately identical for an unknown email and
    /// a wrong password, so responses cannot be used to enumerate accounts.
    #[error("Email or password is incorrect")]
    InvalidCredentials,

    /// Account is suspended
    #[error("This account is suspended")]
    AccountSuspended,

    /// Refresh token is malformed, unknown, or failed secret verification
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Refresh token was already rotated or revoked (replay detection)
    #[error("Refresh token has been revoked")]
    RefreshTokenRevoked,

    /// Refresh token is past its expiry
    #[error("Refresh token has expired")]
    RefreshTokenExpired,

    /// Access token failed signature or claim validation
    #[error("Invalid access token")]
    InvalidAccessToken,

    /// Password reset token is unknown or already consumed
    #[error("Invalid or already used reset token")]
    InvalidResetToken,

    /// Password reset token is past its expiry
    #[error("Reset token has expired")]
    ResetTokenExpired,

    /// Reset token points at a user that no longer exists
    #[error("No account found for this reset token")]
    ResetUnknownUser,

    /// Email verification token is unknown or already consumed
    #[error("Invalid or already used verification token")]
    InvalidVerificationToken,

    /// Email verification token is past its expiry
    #[error("Verification token has expired")]
    ExpiredVerificationToken,

    /// Password does not meet the complexity policy
    #[error("Password validation failed: {0}")]
    PasswordPolicy(#[from] PasswordPolicyError),

    /// Malformed request input (e.g. invalid email format)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::EmailExists => StatusCode::CONFLICT,
            AuthError::TermsNotAccepted
            | AuthError::InvalidResetToken
            | AuthError::ResetTokenExpired
            | AuthError::ResetUnknownUser
            | AuthError::InvalidVerificationToken
            | AuthError::ExpiredVerificationToken
            | AuthError::PasswordPolicy(_)
            | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::RefreshTokenRevoked
            | AuthError::RefreshTokenExpired
            | AuthError::InvalidAccessToken => StatusCode::UNAUTHORIZED,
            AuthError::AccountSuspended => StatusCode::FORBIDDEN,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::EmailExists => "AUTH_EMAIL_EXISTS",
            AuthError::TermsNotAccepted => "AUTH_TERMS_NOT_ACCEPTED",
            AuthError::InvalidCredentials => "AUTH_INVALID_CREDENTIALS",
            AuthError::AccountSuspended => "AUTH_ACCOUNT_SUSPENDED",
            AuthError::InvalidRefreshToken => "AUTH_INVALID_REFRESH_TOKEN",
            AuthError::RefreshTokenRevoked => "AUTH_REFRESH_TOKEN_REVOKED",
            AuthError::RefreshTokenExpired => "AUTH_REFRESH_TOKEN_EXPIRED",
            AuthError::InvalidAccessToken => "AUTH_INVALID_ACCESS_TOKEN",
            AuthError::InvalidResetToken => "AUTH_INVALID_RESET_TOKEN",
            AuthError::ResetTokenExpired => "AUTH_RESET_TOKEN_EXPIRED",
            AuthError::ResetUnknownUser => "AUTH_RESET_UNKNOWN_USER",
            AuthError::InvalidVerificationToken => "AUTH_INVALID_VERIFICATION_TOKEN",
            AuthError::ExpiredVerificationToken => "AUTH_VERIFICATION_TOKEN_EXPIRED",
            AuthError::PasswordPolicy(_) => "AUTH_WEAK_PASSWORD",
            AuthError::Validation(_) => "AUTH_INVALID_REQUEST",
            AuthError::Database(_) | AuthError::Internal(_) => "AUTH_INTERNAL",
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::EmailExists => ErrorKind::Conflict,
            AuthError::TermsNotAccepted
            | AuthError::InvalidResetToken
            | AuthError::ResetTokenExpired
            | AuthError::ResetUnknownUser
            | AuthError::InvalidVerificationToken
            | AuthError::ExpiredVerificationToken
            | AuthError::PasswordPolicy(_)
            | AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::RefreshTokenRevoked
            | AuthError::RefreshTokenExpired
            | AuthError::InvalidAccessToken => ErrorKind::Unauthorized,
            AuthError::AccountSuspended => ErrorKind::Forbidden,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string()).with_code(self.code())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::RefreshTokenRevoked => {
                tracing::warn!("Replay of a revoked refresh token");
            }
            AuthError::AccountSuspended => {
                tracing::warn!("Operation attempted on a suspended account");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::EmailExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::TermsNotAccepted.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::AccountSuspended.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::RefreshTokenRevoked.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidResetToken.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_stable_codes() {
        assert_eq!(AuthError::EmailExists.code(), "AUTH_EMAIL_EXISTS");
        assert_eq!(
            AuthError::InvalidCredentials.code(),
            "AUTH_INVALID_CREDENTIALS"
        );
        assert_eq!(
            AuthError::RefreshTokenExpired.code(),
            "AUTH_REFRESH_TOKEN_EXPIRED"
        );
        assert_eq!(
            AuthError::ExpiredVerificationToken.code(),
            "AUTH_VERIFICATION_TOKEN_EXPIRED"
        );
    }

    #[test]
    fn test_credential_failures_share_wire_shape() {
        // Unknown email and wrong password must be indistinguishable
        let unknown = AuthError::InvalidCredentials;
        let wrong_password = AuthError::InvalidCredentials;
        assert_eq!(unknown.code(), wrong_password.code());
        assert_eq!(unknown.status_code(), wrong_password.status_code());
        assert_eq!(unknown.to_string(), wrong_password.to_string());
    }

    #[test]
    fn test_app_error_carries_code() {
        let err = AuthError::AccountSuspended.to_app_error();
        assert_eq!(err.code(), "AUTH_ACCOUNT_SUSPENDED");
        assert_eq!(err.status_code(), 403);
    }
}
