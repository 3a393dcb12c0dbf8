//! Sign In Use Case
//!
//! Authenticates by email + password and issues a session.

use std::sync::Arc;

use platform::client::ClientInfo;
use platform::password::Secret;

use crate::application::config::AuthConfig;
use crate::application::issue_session::{IssuedSession, issue_session};
use crate::application::tokens::TokenCodec;
use crate::domain::entity::{audit_event::AuditEvent, user::User};
use crate::domain::repository::{AuditRepository, RefreshTokenRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
    /// Lifts the refresh-token lifetime ceiling
    pub remember_me: bool,
    pub client: ClientInfo,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub user: User,
    pub session: IssuedSession,
}

/// Sign in use case
pub struct SignInUseCase<R>
where
    R: UserRepository + RefreshTokenRepository + AuditRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> SignInUseCase<R>
where
    R: UserRepository + RefreshTokenRepository + AuditRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        // Unknown email, malformed email, and wrong password all collapse
        // into the same failure so responses cannot enumerate accounts
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some((mut user, credential)) = self.repo.find_user_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !credential.password_hash.verify(&Secret::new(input.password)) {
            return Err(AuthError::InvalidCredentials);
        }

        // Checked only after the password verifies: suspension is revealed
        // exclusively to someone who already holds the credentials
        if user.is_suspended() {
            return Err(AuthError::AccountSuspended);
        }

        let codec = TokenCodec::new(&self.config);
        let session = issue_session(
            self.repo.as_ref(),
            &self.config,
            &codec,
            &user,
            input.remember_me,
            None,
            &input.client,
        )
        .await?;

        let login_at = user.record_login();
        self.repo.update_last_login(&user.user_id, login_at).await?;

        self.repo
            .create_audit_event(
                &AuditEvent::for_user("auth.login", user.user_id)
                    .with_client(input.client.ip_string(), input.client.user_agent.clone()),
            )
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            remember_me = input.remember_me,
            "User signed in"
        );

        Ok(SignInOutput { user, session })
    }
}
