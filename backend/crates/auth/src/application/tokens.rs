//! Token Codec
//!
//! Two token families with very different shapes:
//!
//! - **Access tokens**: compact signed claims (HS256), short-lived. The
//!   session service only issues them; verification belongs to the
//!   transport layer (middleware) holding the same secret.
//! - **Refresh tokens**: opaque composites `"{id}.{secret}"`. The id is a
//!   UUID stored in plaintext as the record's key, giving O(1) lookup; the
//!   secret is high-entropy random material persisted only as its Argon2id
//!   hash.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::value_object::ids::RefreshTokenId;
use crate::error::{AuthError, AuthResult};

/// Entropy of the refresh-token secret in bytes
const REFRESH_SECRET_BYTES: usize = 32;

/// Claims embedded in an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: user id
    pub sub: String,
    pub email: String,
    /// Plan tier code (`free` | `pro` | `family`)
    pub plan: String,
    /// Informational only; not a capability gate
    pub email_verified: bool,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies access tokens, mints and parses refresh composites
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.token_secret),
            decoding_key: DecodingKey::from_secret(&config.token_secret),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    /// Sign an access token for `user` expiring at `expires_at`
    pub fn sign_access(&self, user: &User, expires_at: DateTime<Utc>) -> AuthResult<String> {
        let claims = AccessClaims {
            sub: user.user_id.to_string(),
            email: user.email.to_string(),
            plan: user.plan.code().to_string(),
            email_verified: user.email_verified(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Access token signing failed: {e}")))
    }

    /// Verify an access token's signature, expiry, issuer, and audience.
    ///
    /// Called by the transport middleware, never by the session service.
    pub fn verify_access(&self, token: &str) -> AuthResult<AccessClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidAccessToken)
    }
}

/// A freshly minted refresh token, before the secret is hashed away
#[derive(Debug)]
pub struct MintedRefresh {
    pub token_id: RefreshTokenId,
    /// Clear-text secret half; hash it for storage, hand the composite to
    /// the client, then drop it
    pub secret: String,
}

impl MintedRefresh {
    /// The externally-visible composite token
    pub fn composite(&self) -> String {
        format!("{}.{}", self.token_id, self.secret)
    }
}

/// Mint a new refresh token id + secret pair
pub fn mint_refresh() -> MintedRefresh {
    MintedRefresh {
        token_id: RefreshTokenId::new(),
        secret: platform::crypto::random_token(REFRESH_SECRET_BYTES),
    }
}

/// Split a composite refresh token into its id and secret halves.
///
/// Exactly two non-empty dot-separated segments, the first a UUID.
/// Returns `None` for anything else; the refresh flow treats that as a hard
/// failure, logout tolerates it as a no-op.
pub fn parse_refresh(raw: &str) -> Option<(RefreshTokenId, String)> {
    let mut segments = raw.split('.');
    let id_part = segments.next()?;
    let secret_part = segments.next()?;

    if segments.next().is_some() || id_part.is_empty() || secret_part.is_empty() {
        return None;
    }

    let token_id = RefreshTokenId::parse(id_part).ok()?;
    Some((token_id, secret_part.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::UserProfile;
    use crate::domain::value_object::email::Email;
    use chrono::Duration;

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig::with_random_secret())
    }

    fn user() -> User {
        User::new(Email::new("a@b.com").unwrap(), UserProfile::default())
    }

    #[test]
    fn test_access_token_roundtrip() {
        let codec = codec();
        let user = user();
        let token = codec
            .sign_access(&user, Utc::now() + Duration::minutes(15))
            .unwrap();

        let claims = codec.verify_access(&token).unwrap();
        assert_eq!(claims.sub, user.user_id.to_string());
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.plan, "free");
        assert!(!claims.email_verified);
    }

    #[test]
    fn test_access_token_rejects_expired() {
        let codec = codec();
        let token = codec
            .sign_access(&user(), Utc::now() - Duration::minutes(5))
            .unwrap();
        assert!(matches!(
            codec.verify_access(&token),
            Err(AuthError::InvalidAccessToken)
        ));
    }

    #[test]
    fn test_access_token_rejects_foreign_secret() {
        let token = codec()
            .sign_access(&user(), Utc::now() + Duration::minutes(15))
            .unwrap();
        // Different codec, different secret
        assert!(codec().verify_access(&token).is_err());
    }

    #[test]
    fn test_access_token_rejects_wrong_audience() {
        let mut config = AuthConfig::with_random_secret();
        let signer = TokenCodec::new(&config);
        let token = signer
            .sign_access(&user(), Utc::now() + Duration::minutes(15))
            .unwrap();

        config.audience = "other-app".to_string();
        let verifier = TokenCodec::new(&config);
        assert!(verifier.verify_access(&token).is_err());
    }

    #[test]
    fn test_mint_and_parse_composite() {
        let minted = mint_refresh();
        let composite = minted.composite();

        let (token_id, secret) = parse_refresh(&composite).unwrap();
        assert_eq!(token_id, minted.token_id);
        assert_eq!(secret, minted.secret);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_refresh("").is_none());
        assert!(parse_refresh("no-dot-at-all").is_none());
        assert!(parse_refresh(".secret").is_none());
        assert!(parse_refresh("id.").is_none());
        assert!(parse_refresh("a.b.c").is_none());
        // First segment must be a UUID
        assert!(parse_refresh("not-a-uuid.secret").is_none());
    }

    #[test]
    fn test_minted_secrets_are_unique() {
        assert_ne!(mint_refresh().secret, mint_refresh().secret);
    }
}
