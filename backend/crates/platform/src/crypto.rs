//! Opaque Token Material
//!
//! Cryptographically secure random material for refresh-token secrets and
//! single-use token strings.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate an opaque URL-safe token string from `entropy_bytes` of randomness.
///
/// The output alphabet is base64url without padding, so the result is safe
/// inside cookies, query strings, and dot-separated composites.
pub fn random_token(entropy_bytes: usize) -> String {
    to_base64url(&random_bytes(entropy_bytes))
}

/// Encode bytes as base64url (no padding)
pub fn to_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url (no padding) to bytes
pub fn from_base64url(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_length() {
        assert_eq!(random_bytes(32).len(), 32);
        assert_eq!(random_bytes(0).len(), 0);
        assert_eq!(random_bytes(64).len(), 64);
    }

    #[test]
    fn test_random_bytes_not_all_zeros() {
        let bytes = random_bytes(32);
        assert!(
            bytes.iter().any(|&b| b != 0),
            "Random bytes should not be all zeros"
        );
    }

    #[test]
    fn test_random_token_alphabet() {
        let token = random_token(32);
        // 32 bytes -> 43 base64url characters, no padding
        assert_eq!(token.len(), 43);
        assert!(!token.contains('='));
        assert!(!token.contains('.'));
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_random_token_uniqueness() {
        assert_ne!(random_token(32), random_token(32));
    }

    #[test]
    fn test_base64url_roundtrip() {
        let data = b"hello world";
        let encoded = to_base64url(data);
        let decoded = from_base64url(&encoded).unwrap();
        assert_eq!(decoded, data);
    }
}
