//! Application Configuration
//!
//! Constructed once at process start and injected into use cases; business
//! logic never reads the environment.

use std::time::Duration;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Safety ceiling on refresh-token lifetime when the user did not ask to be
/// remembered. Only an explicit remember-me lifts it.
pub const REFRESH_TTL_CEILING: Duration = Duration::from_secs(7 * 24 * 3600);

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for access tokens (32 bytes)
    pub token_secret: [u8; 32],
    /// `iss` claim on issued access tokens
    pub issuer: String,
    /// `aud` claim on issued access tokens
    pub audience: String,
    /// Access token TTL (minutes scale)
    pub access_token_ttl: Duration,
    /// Full refresh token TTL, granted when remember-me is set
    pub refresh_token_ttl: Duration,
    /// Email verification token TTL (hours scale)
    pub verification_token_ttl: Duration,
    /// Password reset token TTL (minutes scale, deliberately short)
    pub reset_token_ttl: Duration,
    /// Access cookie name
    pub access_cookie_name: String,
    /// Refresh cookie name
    pub refresh_cookie_name: String,
    /// Whether to require Secure cookies
    pub cookie_secure: bool,
    /// Cookie Domain attribute, per environment
    pub cookie_domain: Option<String>,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Outside production: include raw single-use tokens in responses
    pub debug_tokens: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: [0u8; 32],
            issuer: "finance-api".to_string(),
            audience: "finance-web".to_string(),
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(30 * 24 * 3600),
            verification_token_ttl: Duration::from_secs(24 * 3600),
            reset_token_ttl: Duration::from_secs(30 * 60),
            access_cookie_name: "access".to_string(),
            refresh_cookie_name: "refresh".to_string(),
            cookie_secure: true,
            cookie_domain: None,
            cookie_same_site: SameSite::Lax,
            debug_tokens: false,
        }
    }
}

impl AuthConfig {
    /// Create config with a random token secret (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        Self {
            token_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie, debug tokens)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            debug_tokens: true,
            ..Self::with_random_secret()
        }
    }

    /// Refresh-token lifetime for a session.
    ///
    /// Capped at [`REFRESH_TTL_CEILING`] unless the user explicitly chose
    /// remember-me.
    pub fn effective_refresh_ttl(&self, remember_me: bool) -> Duration {
        if remember_me {
            self.refresh_token_ttl
        } else {
            self.refresh_token_ttl.min(REFRESH_TTL_CEILING)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.access_token_ttl, Duration::from_secs(900));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(30 * 24 * 3600));
        assert!(config.reset_token_ttl < config.verification_token_ttl);
        assert!(config.cookie_secure);
        assert!(!config.debug_tokens);
    }

    #[test]
    fn test_with_random_secret() {
        let a = AuthConfig::with_random_secret();
        let b = AuthConfig::with_random_secret();
        assert_ne!(a.token_secret, [0u8; 32]);
        assert_ne!(a.token_secret, b.token_secret);
    }

    #[test]
    fn test_development_config() {
        let config = AuthConfig::development();
        assert!(!config.cookie_secure);
        assert!(config.debug_tokens);
    }

    #[test]
    fn test_effective_refresh_ttl_capped_without_remember_me() {
        let config = AuthConfig::default();
        assert_eq!(config.effective_refresh_ttl(false), REFRESH_TTL_CEILING);
        assert_eq!(config.effective_refresh_ttl(true), config.refresh_token_ttl);
    }

    #[test]
    fn test_effective_refresh_ttl_short_config_unaffected() {
        let config = AuthConfig {
            refresh_token_ttl: Duration::from_secs(3600),
            ..Default::default()
        };
        // A TTL already below the ceiling is used as-is either way
        assert_eq!(config.effective_refresh_ttl(false), Duration::from_secs(3600));
        assert_eq!(config.effective_refresh_ttl(true), Duration::from_secs(3600));
    }
}
