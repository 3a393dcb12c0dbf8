//! User Status Value Object
//!
//! Three account states:
//! - **Active**: normal account, full access
//! - **Invited**: provisioned but not yet verified; promoted to Active by
//!   email verification
//! - **Suspended**: blocked from logging in and from refreshing sessions
//!
//! Accounts are never hard-deleted by this subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// User account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(i16)]
pub enum UserStatus {
    /// Normal active account
    #[default]
    Active = 0,

    /// Provisioned, waiting on email verification
    Invited = 1,

    /// Suspended account - cannot authenticate or refresh
    Suspended = 2,
}

impl UserStatus {
    /// Get numeric ID for database storage
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    /// Get string code for serialization/API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Invited => "invited",
            Self::Suspended => "suspended",
        }
    }

    /// Check if authentication is allowed
    #[inline]
    pub const fn can_login(&self) -> bool {
        !matches!(self, Self::Suspended)
    }

    /// Create from numeric ID
    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Active),
            1 => Some(Self::Invited),
            2 => Some(Self::Suspended),
            _ => None,
        }
    }

    /// Create from string code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "active" => Some(Self::Active),
            "invited" => Some(Self::Invited),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id() {
        assert_eq!(UserStatus::from_id(0), Some(UserStatus::Active));
        assert_eq!(UserStatus::from_id(1), Some(UserStatus::Invited));
        assert_eq!(UserStatus::from_id(2), Some(UserStatus::Suspended));
        assert_eq!(UserStatus::from_id(99), None);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(UserStatus::from_code("active"), Some(UserStatus::Active));
        assert_eq!(UserStatus::from_code("invited"), Some(UserStatus::Invited));
        assert_eq!(
            UserStatus::from_code("suspended"),
            Some(UserStatus::Suspended)
        );
        assert_eq!(UserStatus::from_code("deleted"), None);
    }

    #[test]
    fn test_can_login() {
        assert!(UserStatus::Active.can_login());
        assert!(UserStatus::Invited.can_login());
        assert!(!UserStatus::Suspended.can_login());
    }

    #[test]
    fn test_default() {
        assert_eq!(UserStatus::default(), UserStatus::Active);
    }
}
