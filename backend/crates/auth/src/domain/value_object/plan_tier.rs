//! Plan Tier Value Object
//!
//! Subscription tier carried on the access token so sibling services can
//! gate features without a user lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription plan tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(i16)]
pub enum PlanTier {
    #[default]
    Free = 0,
    Pro = 1,
    Family = 2,
}

impl PlanTier {
    /// Get numeric ID for database storage
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    /// Get string code for serialization/API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Family => "family",
        }
    }

    /// Create from numeric ID
    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Free),
            1 => Some(Self::Pro),
            2 => Some(Self::Family),
            _ => None,
        }
    }

    /// Create from string code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "free" => Some(Self::Free),
            "pro" => Some(Self::Pro),
            "family" => Some(Self::Family),
            _ => None,
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for tier in [PlanTier::Free, PlanTier::Pro, PlanTier::Family] {
            assert_eq!(PlanTier::from_id(tier.id()), Some(tier));
            assert_eq!(PlanTier::from_code(tier.code()), Some(tier));
        }
        assert_eq!(PlanTier::from_id(7), None);
        assert_eq!(PlanTier::from_code("platinum"), None);
    }

    #[test]
    fn test_default_is_free() {
        assert_eq!(PlanTier::default(), PlanTier::Free);
    }
}
