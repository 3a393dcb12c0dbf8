//! Secret Hashing and Password Policy
//!
//! Memory-hard secret handling with:
//! - Argon2id hashing with pinned cost parameters
//! - Zeroization of clear-text material
//! - Constant-time verification
//!
//! The same [`Secret`]/[`SecretHash`] pair is used for user passwords and
//! for refresh-token secrets: a leaked token-hash store must resist offline
//! brute force exactly like the password store does.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Constants
// ============================================================================

/// Minimum password length in Unicode code points
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Maximum password length in Unicode code points
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Argon2id memory cost in KiB (OWASP recommended: 19 MiB)
const ARGON2_MEMORY_KIB: u32 = 19_456;

/// Argon2id iteration count
const ARGON2_ITERATIONS: u32 = 2;

/// Argon2id lane count
const ARGON2_PARALLELISM: u32 = 1;

/// Process-wide Argon2id instance with pinned parameters
fn argon2() -> Argon2<'static> {
    let params = Params::new(ARGON2_MEMORY_KIB, ARGON2_ITERATIONS, ARGON2_PARALLELISM, None)
        .expect("pinned Argon2 parameters are valid");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password is too short
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    /// Password is too long
    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    /// Password lacks an uppercase letter
    #[error("Password must contain an uppercase letter")]
    MissingUppercase,

    /// Password lacks a lowercase letter
    #[error("Password must contain a lowercase letter")]
    MissingLowercase,

    /// Password lacks a digit
    #[error("Password must contain a digit")]
    MissingDigit,

    /// Password lacks a symbol
    #[error("Password must contain a symbol")]
    MissingSymbol,
}

/// Secret hashing/verification errors
#[derive(Debug, Error)]
pub enum SecretHashError {
    /// Hashing operation failed
    #[error("Secret hashing failed: {0}")]
    HashingFailed(String),

    /// Invalid hash format
    #[error("Invalid secret hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Password Policy
// ============================================================================

/// Validate a candidate password against the server-side complexity policy.
///
/// Enforced at the request-validation boundary, before any hashing happens:
/// 12 to 128 Unicode code points, with at least one uppercase letter, one
/// lowercase letter, one digit, and one symbol.
pub fn validate_password_policy(raw: &str) -> Result<(), PasswordPolicyError> {
    let char_count = raw.chars().count();

    if char_count < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort {
            min: MIN_PASSWORD_LENGTH,
            actual: char_count,
        });
    }

    if char_count > MAX_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooLong {
            max: MAX_PASSWORD_LENGTH,
            actual: char_count,
        });
    }

    if !raw.chars().any(|c| c.is_uppercase()) {
        return Err(PasswordPolicyError::MissingUppercase);
    }
    if !raw.chars().any(|c| c.is_lowercase()) {
        return Err(PasswordPolicyError::MissingLowercase);
    }
    if !raw.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordPolicyError::MissingDigit);
    }
    if !raw.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        return Err(PasswordPolicyError::MissingSymbol);
    }

    Ok(())
}

// ============================================================================
// Clear Text Secret (Zeroized on drop)
// ============================================================================

/// Clear-text secret with automatic memory zeroization
///
/// Wraps a password or a refresh-token secret on its way to the hasher.
/// The buffer is securely erased when the value is dropped.
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Wrap raw secret material.
    ///
    /// Unicode is NFKC-normalized so that the same password typed through
    /// different input methods verifies against the same hash. Policy checks
    /// belong to [`validate_password_policy`], not here: token secrets pass
    /// through this type too and are exempt from the password policy.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw: String = raw.into();
        let normalized: String = raw.nfkc().collect();
        Self(normalized)
    }

    /// Get the secret as bytes for hashing
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash the secret using Argon2id with the pinned parameters.
    ///
    /// ## Returns
    /// PHC-formatted hash string wrapped in [`SecretHash`]
    pub fn hash(&self) -> Result<SecretHash, SecretHashError> {
        let salt = SaltString::generate(OsRng);

        let hash = argon2()
            .hash_password(self.as_bytes(), &salt)
            .map_err(|e| SecretHashError::HashingFailed(e.to_string()))?;

        Ok(SecretHash {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// Secret Hash (Safe to store)
// ============================================================================

/// Hashed secret in PHC string format
///
/// The PHC string embeds the algorithm identifier, version, parameters,
/// salt, and hash, so verification needs no side-channel configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretHash {
    hash: String,
}

impl SecretHash {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, SecretHashError> {
        let hash = s.into();

        // Validate it's a valid PHC string
        PasswordHash::new(&hash).map_err(|_| SecretHashError::InvalidHashFormat)?;

        Ok(Self { hash })
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a clear-text secret against this hash.
    ///
    /// Argon2 performs the comparison in constant time. Verification is
    /// deterministic; hashing is not (fresh salt each time).
    pub fn verify(&self, secret: &Secret) -> bool {
        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        argon2()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Check if the hash was produced with outdated parameters
    pub fn needs_rehash(&self) -> bool {
        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => return true,
        };

        if parsed_hash.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }

        let Ok(params) = Params::try_from(&parsed_hash) else {
            return true;
        };

        params.m_cost() != ARGON2_MEMORY_KIB
            || params.t_cost() != ARGON2_ITERATIONS
            || params.p_cost() != ARGON2_PARALLELISM
    }
}

impl fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretHash")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
