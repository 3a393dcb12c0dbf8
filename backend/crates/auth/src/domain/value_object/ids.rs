//! Typed ID aliases for the auth domain

use kernel::id::Id;

pub struct UserMarker;
pub type UserId = Id<UserMarker>;

pub struct RefreshTokenMarker;
pub type RefreshTokenId = Id<RefreshTokenMarker>;

pub struct EmailVerificationMarker;
pub type EmailVerificationTokenId = Id<EmailVerificationMarker>;

pub struct PasswordResetMarker;
pub type PasswordResetTokenId = Id<PasswordResetMarker>;

pub struct AuditEventMarker;
pub type AuditEventId = Id<AuditEventMarker>;
