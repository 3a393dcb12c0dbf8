//! User Entity
//!
//! Core identity record. Secret material lives in the Credential entity.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email, ids::UserId, plan_tier::PlanTier, user_status::UserStatus,
};

/// Optional profile fields captured at signup
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub timezone: Option<String>,
}

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Normalized email (unique)
    pub email: Email,
    /// Account status
    pub status: UserStatus,
    /// Subscription tier
    pub plan: PlanTier,
    /// When the email was verified; None until VerifyEmail succeeds
    pub email_verified_at: Option<DateTime<Utc>>,
    /// Display name
    pub display_name: Option<String>,
    /// IANA timezone name
    pub timezone: Option<String>,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user at signup: active, unverified, free tier
    pub fn new(email: Email, profile: UserProfile) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            email,
            status: UserStatus::default(),
            plan: PlanTier::default(),
            email_verified_at: None,
            display_name: profile.display_name,
            timezone: profile.timezone,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record successful login, returning the timestamp used
    pub fn record_login(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
        now
    }

    /// Mark the email as verified; an Invited account becomes Active
    pub fn mark_email_verified(&mut self, verified_at: DateTime<Utc>) {
        self.email_verified_at = Some(verified_at);
        if self.status == UserStatus::Invited {
            self.status = UserStatus::Active;
        }
        self.updated_at = verified_at;
    }

    /// Check if the email has been verified
    pub fn email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }

    /// Check if the account is suspended
    pub fn is_suspended(&self) -> bool {
        self.status == UserStatus::Suspended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User::new(
            Email::new("a@b.com").unwrap(),
            UserProfile {
                display_name: Some("Alice".to_string()),
                timezone: None,
            },
        )
    }

    #[test]
    fn test_new_user_defaults() {
        let user = test_user();
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.plan, PlanTier::Free);
        assert!(user.email_verified_at.is_none());
        assert!(!user.email_verified());
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn test_record_login() {
        let mut user = test_user();
        let at = user.record_login();
        assert_eq!(user.last_login_at, Some(at));
    }

    #[test]
    fn test_mark_email_verified_promotes_invited() {
        let mut user = test_user();
        user.status = UserStatus::Invited;

        let now = Utc::now();
        user.mark_email_verified(now);

        assert_eq!(user.email_verified_at, Some(now));
        assert_eq!(user.status, UserStatus::Active);
    }

    #[test]
    fn test_mark_email_verified_leaves_suspended() {
        let mut user = test_user();
        user.status = UserStatus::Suspended;

        user.mark_email_verified(Utc::now());
        // Verification never lifts a suspension
        assert_eq!(user.status, UserStatus::Suspended);
        assert!(user.email_verified());
    }
}
