//! Sign Up Use Case
//!
//! Creates an account and its first session.

use std::sync::Arc;

use platform::client::ClientInfo;
use platform::password::Secret;

use crate::application::config::AuthConfig;
use crate::application::issue_session::{IssuedSession, issue_session};
use crate::application::tokens::TokenCodec;
use crate::domain::entity::{
    audit_event::AuditEvent,
    credential::Credential,
    one_time_token::EmailVerificationToken,
    user::{User, UserProfile},
};
use crate::domain::notifier::{Notifier, VerificationEmail};
use crate::domain::repository::{
    AuditRepository, OneTimeTokenRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub accept_terms: bool,
    pub display_name: Option<String>,
    pub timezone: Option<String>,
    pub client: ClientInfo,
}

/// Sign up output
#[derive(Debug)]
pub struct SignUpOutput {
    pub user: User,
    pub session: IssuedSession,
    /// Raw verification token; exposed on the wire only when debug tokens
    /// are enabled
    pub verification_token: String,
}

/// Sign up use case
pub struct SignUpUseCase<R, N>
where
    R: UserRepository + RefreshTokenRepository + OneTimeTokenRepository + AuditRepository,
    N: Notifier,
{
    repo: Arc<R>,
    notifier: Arc<N>,
    config: Arc<AuthConfig>,
}

impl<R, N> SignUpUseCase<R, N>
where
    R: UserRepository + RefreshTokenRepository + OneTimeTokenRepository + AuditRepository,
    N: Notifier,
{
    pub fn new(repo: Arc<R>, notifier: Arc<N>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        if !input.accept_terms {
            return Err(AuthError::TermsNotAccepted);
        }

        let email = Email::new(&input.email)?;

        // Best-effort pre-check; the unique index decides concurrent signups
        if self.repo.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailExists);
        }

        let password_hash = Secret::new(input.password)
            .hash()
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let user = User::new(
            email,
            UserProfile {
                display_name: input.display_name,
                timezone: input.timezone,
            },
        );
        let credential = Credential::new(user.user_id, password_hash);

        // User and credential land in one transaction
        self.repo.create_user(&user, &credential).await?;

        let verification_ttl = chrono::Duration::from_std(self.config.verification_token_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid verification TTL: {e}")))?;
        let verification = EmailVerificationToken::issue(user.user_id, verification_ttl);
        self.repo
            .save_email_verification_token(&verification)
            .await?;

        self.repo
            .create_audit_event(
                &AuditEvent::for_user("auth.signup", user.user_id)
                    .with_client(input.client.ip_string(), input.client.user_agent.clone()),
            )
            .await?;

        // A brand-new account is unverified but still gets a usable pair;
        // no remember-me at signup, so the lifetime ceiling applies.
        let codec = TokenCodec::new(&self.config);
        let session = issue_session(
            self.repo.as_ref(),
            &self.config,
            &codec,
            &user,
            false,
            None,
            &input.client,
        )
        .await?;

        // Delivery runs after the token pair is committed; failures are the
        // collaborator's concern and never block account creation.
        if let Err(e) = self
            .notifier
            .send_verification_email(VerificationEmail {
                to: user.email.clone(),
                display_name: user.display_name.clone(),
                token: verification.token.clone(),
                expires_at: verification.expires_at,
            })
            .await
        {
            tracing::warn!(
                user_id = %user.user_id,
                error = %e,
                "Verification email delivery failed"
            );
        }

        tracing::info!(
            user_id = %user.user_id,
            "User signed up"
        );

        Ok(SignUpOutput {
            user,
            session,
            verification_token: verification.token,
        })
    }
}
