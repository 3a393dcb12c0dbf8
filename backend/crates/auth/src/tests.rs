//! Scenario tests for the session service
//!
//! Driven through the in-memory repository with a recording notifier, so
//! every repository side effect and every outbound email is observable.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use platform::client::ClientInfo;
use platform::password::Secret;

use crate::application::issue_session::issue_session;
use crate::application::tokens::{self, TokenCodec};
use crate::application::{
    AuthConfig, PasswordResetUseCase, RefreshSessionInput, RefreshSessionOutput,
    RefreshSessionUseCase, SignInInput, SignInOutput, SignInUseCase, SignOutUseCase, SignUpInput,
    SignUpOutput, SignUpUseCase, VerifyEmailUseCase,
};
use crate::domain::entity::credential::Credential;
use crate::domain::entity::one_time_token::{EmailVerificationToken, PasswordResetToken};
use crate::domain::entity::refresh_token::RefreshToken;
use crate::domain::entity::user::{User, UserProfile};
use crate::domain::notifier::{Notifier, PasswordResetEmail, VerificationEmail};
use crate::domain::repository::{
    OneTimeTokenRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::email::Email;
use crate::domain::value_object::ids::RefreshTokenId;
use crate::domain::value_object::user_status::UserStatus;
use crate::error::{AuthError, AuthResult};
use crate::infra::memory::MemoryAuthRepository;

const PASSWORD: &str = "Aa1!aaaaaaaa";
const NEW_PASSWORD: &str = "Bb2?bbbbbbbb";

/// Notifier that records deliveries for assertions
#[derive(Clone, Default)]
struct RecordingNotifier {
    verifications: Arc<Mutex<Vec<VerificationEmail>>>,
    resets: Arc<Mutex<Vec<PasswordResetEmail>>>,
}

impl RecordingNotifier {
    fn verification_count(&self) -> usize {
        self.verifications.lock().unwrap().len()
    }

    fn reset_count(&self) -> usize {
        self.resets.lock().unwrap().len()
    }

    fn last_verification(&self) -> Option<VerificationEmail> {
        self.verifications.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    async fn send_verification_email(&self, mail: VerificationEmail) -> AuthResult<()> {
        self.verifications.lock().unwrap().push(mail);
        Ok(())
    }

    async fn send_password_reset_email(&self, mail: PasswordResetEmail) -> AuthResult<()> {
        self.resets.lock().unwrap().push(mail);
        Ok(())
    }
}

struct TestCtx {
    repo: Arc<MemoryAuthRepository>,
    notifier: Arc<RecordingNotifier>,
    config: Arc<AuthConfig>,
}

fn ctx() -> TestCtx {
    TestCtx {
        repo: Arc::new(MemoryAuthRepository::new()),
        notifier: Arc::new(RecordingNotifier::default()),
        config: Arc::new(AuthConfig::with_random_secret()),
    }
}

async fn do_sign_up(ctx: &TestCtx, email: &str) -> AuthResult<SignUpOutput> {
    SignUpUseCase::new(ctx.repo.clone(), ctx.notifier.clone(), ctx.config.clone())
        .execute(SignUpInput {
            email: email.to_string(),
            password: PASSWORD.to_string(),
            accept_terms: true,
            display_name: None,
            timezone: None,
            client: ClientInfo::default(),
        })
        .await
}

async fn do_sign_in(
    ctx: &TestCtx,
    email: &str,
    password: &str,
    remember_me: bool,
) -> AuthResult<SignInOutput> {
    SignInUseCase::new(ctx.repo.clone(), ctx.config.clone())
        .execute(SignInInput {
            email: email.to_string(),
            password: password.to_string(),
            remember_me,
            client: ClientInfo::default(),
        })
        .await
}

async fn do_refresh(ctx: &TestCtx, refresh_token: &str) -> AuthResult<RefreshSessionOutput> {
    RefreshSessionUseCase::new(ctx.repo.clone(), ctx.config.clone())
        .execute(RefreshSessionInput {
            refresh_token: refresh_token.to_string(),
            client: ClientInfo::default(),
        })
        .await
}

fn reset_use_case(ctx: &TestCtx) -> PasswordResetUseCase<MemoryAuthRepository, RecordingNotifier> {
    PasswordResetUseCase::new(ctx.repo.clone(), ctx.notifier.clone(), ctx.config.clone())
}

mod signup_tests {
    use super::*;

    #[tokio::test]
    async fn test_signup_creates_active_unverified_account() {
        let ctx = ctx();
        let output = do_sign_up(&ctx, "a@b.com").await.unwrap();

        assert_eq!(output.user.status, UserStatus::Active);
        assert!(output.user.email_verified_at.is_none());
        assert_eq!(output.user.email.as_str(), "a@b.com");

        // A pending verification token is persisted, unconsumed
        let tokens = ctx.repo.verification_tokens_for_user(&output.user.user_id);
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].consumed_at.is_none());
        assert_eq!(tokens[0].token, output.verification_token);
    }

    #[tokio::test]
    async fn test_signup_issues_usable_pair_before_verification() {
        let ctx = ctx();
        let output = do_sign_up(&ctx, "a@b.com").await.unwrap();

        // Refresh pair is live immediately
        assert!(do_refresh(&ctx, &output.session.refresh_token).await.is_ok());

        // Access token carries the unverified flag as information only
        let codec = TokenCodec::new(&ctx.config);
        let claims = codec.verify_access(&output.session.access_token).unwrap();
        assert!(!claims.email_verified);
        assert_eq!(claims.sub, output.user.user_id.to_string());
    }

    #[tokio::test]
    async fn test_signup_sends_verification_email_with_token() {
        let ctx = ctx();
        let output = do_sign_up(&ctx, "a@b.com").await.unwrap();

        assert_eq!(ctx.notifier.verification_count(), 1);
        let mail = ctx.notifier.last_verification().unwrap();
        assert_eq!(mail.to.as_str(), "a@b.com");
        assert_eq!(mail.token, output.verification_token);
    }

    #[tokio::test]
    async fn test_signup_records_audit_event() {
        let ctx = ctx();
        do_sign_up(&ctx, "a@b.com").await.unwrap();
        assert!(ctx.repo.audit_actions().contains(&"auth.signup".to_string()));
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_conflicts() {
        let ctx = ctx();
        do_sign_up(&ctx, "a@b.com").await.unwrap();

        let err = do_sign_up(&ctx, "a@b.com").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailExists));

        // Normalization: a case variant is the same address
        let err = do_sign_up(&ctx, "A@B.COM").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailExists));
    }

    #[tokio::test]
    async fn test_signup_requires_terms() {
        let ctx = ctx();
        let err = SignUpUseCase::new(ctx.repo.clone(), ctx.notifier.clone(), ctx.config.clone())
            .execute(SignUpInput {
                email: "a@b.com".to_string(),
                password: PASSWORD.to_string(),
                accept_terms: false,
                display_name: None,
                timezone: None,
                client: ClientInfo::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::TermsNotAccepted));
        // Nothing was created
        let email = Email::new("a@b.com").unwrap();
        assert!(ctx.repo.find_user_by_email(&email).await.unwrap().is_none());
        assert!(ctx.repo.audit_actions().is_empty());
    }
}

mod login_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_returns_pair_and_updates_last_login() {
        let ctx = ctx();
        do_sign_up(&ctx, "a@b.com").await.unwrap();

        let output = do_sign_in(&ctx, "a@b.com", PASSWORD, false).await.unwrap();
        assert!(output.user.last_login_at.is_some());
        assert!(!output.session.refresh_token.is_empty());

        let email = Email::new("a@b.com").unwrap();
        let (stored, _) = ctx.repo.find_user_by_email(&email).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
        assert!(ctx.repo.audit_actions().contains(&"auth.login".to_string()));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let ctx = ctx();
        do_sign_up(&ctx, "a@b.com").await.unwrap();

        let unknown = do_sign_in(&ctx, "nobody@b.com", PASSWORD, false)
            .await
            .unwrap_err();
        let wrong_password = do_sign_in(&ctx, "a@b.com", "Wrong1!wrongwrong", false)
            .await
            .unwrap_err();
        let malformed = do_sign_in(&ctx, "not-an-email", PASSWORD, false)
            .await
            .unwrap_err();

        for err in [&unknown, &wrong_password, &malformed] {
            assert!(matches!(err, AuthError::InvalidCredentials));
            assert_eq!(err.code(), "AUTH_INVALID_CREDENTIALS");
            assert_eq!(err.status_code().as_u16(), 401);
        }
    }

    #[tokio::test]
    async fn test_login_suspended_after_password_check() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();
        ctx.repo
            .set_user_status(&signup.user.user_id, UserStatus::Suspended);

        let before = ctx.repo.refresh_tokens_for_user(&signup.user.user_id).len();

        // Correct password on a suspended account reveals the suspension
        let err = do_sign_in(&ctx, "a@b.com", PASSWORD, false).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountSuspended));
        assert_eq!(err.code(), "AUTH_ACCOUNT_SUSPENDED");
        assert_eq!(err.status_code().as_u16(), 403);

        // Wrong password still reports invalid credentials, not suspension
        let err = do_sign_in(&ctx, "a@b.com", "Wrong1!wrongwrong", false)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        // No new refresh token was persisted by either attempt
        let after = ctx.repo.refresh_tokens_for_user(&signup.user.user_id).len();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_remember_me_bounds_refresh_lifetime() {
        let ctx = ctx();
        do_sign_up(&ctx, "a@b.com").await.unwrap();

        let short = do_sign_in(&ctx, "a@b.com", PASSWORD, false).await.unwrap();
        let long = do_sign_in(&ctx, "a@b.com", PASSWORD, true).await.unwrap();

        let now = Utc::now();
        let short_ttl = short.session.refresh_expires_at - now;
        let long_ttl = long.session.refresh_expires_at - now;

        // min(configured 30d, ceiling 7d) without remember-me
        assert!(short_ttl > Duration::days(7) - Duration::minutes(1));
        assert!(short_ttl <= Duration::days(7));

        // Full configured TTL with remember-me
        assert!(long_ttl > Duration::days(30) - Duration::minutes(1));
        assert!(long_ttl <= Duration::days(30));
    }
}

mod refresh_tests {
    use super::*;

    #[tokio::test]
    async fn test_rotation_links_old_to_new() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();
        let old_id = signup.session.refresh_token_id;

        let rotated = do_refresh(&ctx, &signup.session.refresh_token).await.unwrap();

        let old_record = ctx.repo.refresh_token(&old_id).unwrap();
        assert!(old_record.revoked_at.is_some());
        assert_eq!(
            old_record.replaced_by_token_id,
            Some(rotated.session.refresh_token_id)
        );

        assert!(ctx.repo.audit_actions().contains(&"auth.refresh".to_string()));
    }

    #[tokio::test]
    async fn test_replay_of_rotated_token_is_rejected() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();

        do_refresh(&ctx, &signup.session.refresh_token).await.unwrap();

        // The stolen-and-already-used token comes back: hard rejection
        let err = do_refresh(&ctx, &signup.session.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenRevoked));
        assert_eq!(err.code(), "AUTH_REFRESH_TOKEN_REVOKED");
    }

    #[tokio::test]
    async fn test_rotation_chain_continues() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();

        let first = do_refresh(&ctx, &signup.session.refresh_token).await.unwrap();
        let second = do_refresh(&ctx, &first.session.refresh_token).await.unwrap();

        let mid = ctx.repo.refresh_token(&first.session.refresh_token_id).unwrap();
        assert_eq!(
            mid.replaced_by_token_id,
            Some(second.session.refresh_token_id)
        );
    }

    #[tokio::test]
    async fn test_malformed_tokens_fail_hard() {
        let ctx = ctx();
        do_sign_up(&ctx, "a@b.com").await.unwrap();

        for raw in ["", "garbage", "a.b.c", ".secret", "id."] {
            let err = do_refresh(&ctx, raw).await.unwrap_err();
            assert!(
                matches!(err, AuthError::InvalidRefreshToken),
                "expected hard failure for {raw:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_token_id_is_rejected() {
        let ctx = ctx();
        do_sign_up(&ctx, "a@b.com").await.unwrap();

        let ghost = format!("{}.{}", uuid::Uuid::new_v4(), "somesecret");
        let err = do_refresh(&ctx, &ghost).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn test_expired_token_is_closed_out() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();

        // Craft an expired-but-not-revoked record
        let token_id = RefreshTokenId::new();
        let now = Utc::now();
        let record = RefreshToken::new(
            token_id,
            signup.user.user_id,
            Secret::new("stale-secret").hash().unwrap(),
            now - Duration::days(8),
            now - Duration::days(1),
            None,
            None,
        );
        ctx.repo.save_refresh_token(&record).await.unwrap();

        let composite = format!("{}.{}", token_id, "stale-secret");
        let err = do_refresh(&ctx, &composite).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenExpired));
        assert_eq!(err.code(), "AUTH_REFRESH_TOKEN_EXPIRED");

        // Defense in depth: the expired record is now revoked too
        let stored = ctx.repo.refresh_token(&token_id).unwrap();
        assert!(stored.revoked_at.is_some());
    }

    #[tokio::test]
    async fn test_secret_mismatch_revokes_the_id() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();
        let token_id = signup.session.refresh_token_id;

        let forged = format!("{}.{}", token_id, "guessed-secret");
        let err = do_refresh(&ctx, &forged).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));

        // The guessing attempt killed the id: the real composite is dead too
        let stored = ctx.repo.refresh_token(&token_id).unwrap();
        assert!(stored.revoked_at.is_some());
        let err = do_refresh(&ctx, &signup.session.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenRevoked));
    }

    #[tokio::test]
    async fn test_suspended_owner_revokes_token() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();
        ctx.repo
            .set_user_status(&signup.user.user_id, UserStatus::Suspended);

        let err = do_refresh(&ctx, &signup.session.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountSuspended));

        let stored = ctx
            .repo
            .refresh_token(&signup.session.refresh_token_id)
            .unwrap();
        assert!(stored.revoked_at.is_some());
    }

    #[tokio::test]
    async fn test_rotation_race_loser_withdraws_its_token() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();
        let old_id = signup.session.refresh_token_id;

        // The "winner" rotated the old token a moment earlier
        assert!(
            ctx.repo
                .revoke_refresh_token(&old_id, Utc::now(), None)
                .await
                .unwrap()
        );

        // The loser reaches issuance with a stale rotation target
        let codec = TokenCodec::new(&ctx.config);
        let err = issue_session(
            ctx.repo.as_ref(),
            &ctx.config,
            &codec,
            &signup.user,
            false,
            Some(old_id),
            &ClientInfo::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenRevoked));

        // No live token leaked from the losing attempt
        let live = ctx
            .repo
            .refresh_tokens_for_user(&signup.user.user_id)
            .into_iter()
            .filter(|t| t.revoked_at.is_none())
            .count();
        assert_eq!(live, 0);
    }
}

mod logout_tests {
    use super::*;

    #[tokio::test]
    async fn test_logout_without_token_is_a_no_op() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();
        let actions_before = ctx.repo.audit_actions();

        let use_case = SignOutUseCase::new(ctx.repo.clone());
        use_case.execute(None).await;
        use_case.execute(Some("garbage")).await;
        use_case.execute(Some("a.b.c")).await;

        // No repository mutation of any kind
        assert_eq!(ctx.repo.audit_actions(), actions_before);
        let stored = ctx
            .repo
            .refresh_token(&signup.session.refresh_token_id)
            .unwrap();
        assert!(stored.revoked_at.is_none());
    }

    #[tokio::test]
    async fn test_logout_revokes_and_audits_as_system() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();

        SignOutUseCase::new(ctx.repo.clone())
            .execute(Some(&signup.session.refresh_token))
            .await;

        let stored = ctx
            .repo
            .refresh_token(&signup.session.refresh_token_id)
            .unwrap();
        assert!(stored.revoked_at.is_some());
        assert!(stored.replaced_by_token_id.is_none());

        let logout_event = ctx
            .repo
            .audit_events()
            .into_iter()
            .find(|e| e.action == "auth.logout")
            .unwrap();
        assert_eq!(logout_event.actor, "system");
        assert!(logout_event.user_id.is_none());

        // The revoked token is dead for refresh
        let err = do_refresh(&ctx, &signup.session.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenRevoked));
    }
}

mod password_reset_tests {
    use super::*;

    #[tokio::test]
    async fn test_request_for_unknown_email_does_nothing_visible() {
        let ctx = ctx();
        do_sign_up(&ctx, "a@b.com").await.unwrap();

        // Unknown and malformed emails both succeed silently
        reset_use_case(&ctx)
            .request("nobody@b.com", &ClientInfo::default())
            .await
            .unwrap();
        reset_use_case(&ctx)
            .request("not-an-email", &ClientInfo::default())
            .await
            .unwrap();

        assert_eq!(ctx.notifier.reset_count(), 0);
    }

    #[tokio::test]
    async fn test_request_for_known_email_creates_token_and_mail() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();

        reset_use_case(&ctx)
            .request("a@b.com", &ClientInfo::default())
            .await
            .unwrap();

        let tokens = ctx.repo.reset_tokens_for_user(&signup.user.user_id);
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].consumed_at.is_none());
        assert_eq!(ctx.notifier.reset_count(), 1);
        assert!(
            ctx.repo
                .audit_actions()
                .contains(&"auth.password_reset_request".to_string())
        );
    }

    #[tokio::test]
    async fn test_reset_revokes_every_session() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();
        do_sign_in(&ctx, "a@b.com", PASSWORD, false).await.unwrap();
        do_sign_in(&ctx, "a@b.com", PASSWORD, true).await.unwrap();

        let live_before = ctx
            .repo
            .refresh_tokens_for_user(&signup.user.user_id)
            .into_iter()
            .filter(|t| t.revoked_at.is_none())
            .count();
        assert_eq!(live_before, 3);

        reset_use_case(&ctx)
            .request("a@b.com", &ClientInfo::default())
            .await
            .unwrap();
        let token = ctx.repo.reset_tokens_for_user(&signup.user.user_id)[0]
            .token
            .clone();

        reset_use_case(&ctx)
            .reset(&token, NEW_PASSWORD.to_string(), &ClientInfo::default())
            .await
            .unwrap();

        // Every refresh token now carries a revocation timestamp
        let tokens = ctx.repo.refresh_tokens_for_user(&signup.user.user_id);
        assert!(tokens.iter().all(|t| t.revoked_at.is_some()));

        // Old password dead, new password live
        assert!(matches!(
            do_sign_in(&ctx, "a@b.com", PASSWORD, false).await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(do_sign_in(&ctx, "a@b.com", NEW_PASSWORD, false).await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_token_is_single_use() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();
        reset_use_case(&ctx)
            .request("a@b.com", &ClientInfo::default())
            .await
            .unwrap();
        let token = ctx.repo.reset_tokens_for_user(&signup.user.user_id)[0]
            .token
            .clone();

        reset_use_case(&ctx)
            .reset(&token, NEW_PASSWORD.to_string(), &ClientInfo::default())
            .await
            .unwrap();

        let err = reset_use_case(&ctx)
            .reset(&token, "Cc3#cccccccc".to_string(), &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResetToken));
    }

    #[tokio::test]
    async fn test_unknown_reset_token() {
        let ctx = ctx();
        let err = reset_use_case(&ctx)
            .reset("no-such-token", NEW_PASSWORD.to_string(), &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResetToken));
    }

    #[tokio::test]
    async fn test_expired_reset_token_is_burned_by_the_attempt() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();

        let mut token = PasswordResetToken::issue(signup.user.user_id, Duration::minutes(30));
        token.expires_at = Utc::now() - Duration::minutes(1);
        ctx.repo.create_password_reset_token(&token).await.unwrap();

        let err = reset_use_case(&ctx)
            .reset(&token.token, NEW_PASSWORD.to_string(), &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ResetTokenExpired));
        assert_eq!(err.code(), "AUTH_RESET_TOKEN_EXPIRED");

        // The failed attempt consumed the record, so a retry reports
        // "already consumed", not "expired" - consumed check comes first
        let err = reset_use_case(&ctx)
            .reset(&token.token, NEW_PASSWORD.to_string(), &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResetToken));

        // And the password was never changed
        assert!(do_sign_in(&ctx, "a@b.com", PASSWORD, false).await.is_ok());
    }
}

mod verify_email_tests {
    use super::*;

    #[tokio::test]
    async fn test_verify_marks_user() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();

        let user = VerifyEmailUseCase::new(ctx.repo.clone())
            .execute(&signup.verification_token, &ClientInfo::default())
            .await
            .unwrap();

        assert!(user.email_verified());
        assert_eq!(user.status, UserStatus::Active);
        assert!(
            ctx.repo
                .audit_actions()
                .contains(&"auth.email_verify".to_string())
        );

        // Later sessions carry the verified claim
        let login = do_sign_in(&ctx, "a@b.com", PASSWORD, false).await.unwrap();
        let claims = TokenCodec::new(&ctx.config)
            .verify_access(&login.session.access_token)
            .unwrap();
        assert!(claims.email_verified);
    }

    #[tokio::test]
    async fn test_verify_promotes_invited_account() {
        let ctx = ctx();

        let mut user = User::new(Email::new("invited@b.com").unwrap(), UserProfile::default());
        user.status = UserStatus::Invited;
        let credential = Credential::new(user.user_id, Secret::new(PASSWORD).hash().unwrap());
        ctx.repo.create_user(&user, &credential).await.unwrap();

        let token = EmailVerificationToken::issue(user.user_id, Duration::hours(24));
        ctx.repo.save_email_verification_token(&token).await.unwrap();

        let verified = VerifyEmailUseCase::new(ctx.repo.clone())
            .execute(&token.token, &ClientInfo::default())
            .await
            .unwrap();
        assert_eq!(verified.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn test_verification_token_is_single_use() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();
        let use_case = VerifyEmailUseCase::new(ctx.repo.clone());

        use_case
            .execute(&signup.verification_token, &ClientInfo::default())
            .await
            .unwrap();

        let err = use_case
            .execute(&signup.verification_token, &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidVerificationToken));
    }

    #[tokio::test]
    async fn test_expired_verification_token() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();

        let mut token = EmailVerificationToken::issue(signup.user.user_id, Duration::hours(24));
        token.expires_at = Utc::now() - Duration::hours(1);
        ctx.repo.save_email_verification_token(&token).await.unwrap();

        let use_case = VerifyEmailUseCase::new(ctx.repo.clone());
        let err = use_case
            .execute(&token.token, &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ExpiredVerificationToken));

        // Burned by the attempt: the retry sees "already consumed"
        let err = use_case
            .execute(&token.token, &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidVerificationToken));
    }
}

mod consume_contract_tests {
    use super::*;

    #[tokio::test]
    async fn test_exactly_one_consume_succeeds() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();

        let token = &signup.verification_token;
        let now = Utc::now();

        let first = ctx
            .repo
            .consume_email_verification_token(token, now)
            .await
            .unwrap();
        assert!(first.is_some());
        assert_eq!(first.unwrap().consumed_at, Some(now));

        // Every subsequent consume of the same token fails
        for _ in 0..3 {
            let again = ctx
                .repo
                .consume_email_verification_token(token, Utc::now())
                .await
                .unwrap();
            assert!(again.is_none());
        }
    }

    #[tokio::test]
    async fn test_conditional_revoke_has_one_winner() {
        let ctx = ctx();
        let signup = do_sign_up(&ctx, "a@b.com").await.unwrap();
        let token_id = signup.session.refresh_token_id;
        let now = Utc::now();

        let first = ctx
            .repo
            .revoke_refresh_token(&token_id, now, None)
            .await
            .unwrap();
        let second = ctx
            .repo
            .revoke_refresh_token(&token_id, now, Some(RefreshTokenId::new()))
            .await
            .unwrap();

        assert!(first);
        assert!(!second);

        // The loser's replaced_by link was not applied
        let stored = ctx.repo.refresh_token(&token_id).unwrap();
        assert!(stored.replaced_by_token_id.is_none());
    }
}

mod dto_tests {
    use super::*;
    use crate::presentation::dto::{SignUpRequest, SignUpResponse, SessionDto, UserDto};

    #[test]
    fn test_signup_request_terms_default_to_false() {
        let req: SignUpRequest =
            serde_json::from_str(r#"{"email":"a@b.com","password":"Aa1!aaaaaaaa"}"#).unwrap();
        assert!(!req.accept_terms);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_signup_request_rejects_weak_password() {
        let req: SignUpRequest = serde_json::from_str(
            r#"{"email":"a@b.com","password":"weakpassword","acceptTerms":true}"#,
        )
        .unwrap();
        let err = req.validate().unwrap_err();
        assert_eq!(err.code(), "AUTH_WEAK_PASSWORD");
        assert_eq!(err.status_code().as_u16(), 400);
    }

    #[test]
    fn test_signup_response_hides_absent_debug_token() {
        let user = User::new(Email::new("a@b.com").unwrap(), UserProfile::default());
        let minted = tokens::mint_refresh();
        let response = SignUpResponse {
            user: UserDto::from(&user),
            session: SessionDto {
                access_token: "jwt".to_string(),
                access_token_expires_at: Utc::now(),
                refresh_token: minted.composite(),
                refresh_token_expires_at: Utc::now(),
            },
            requires_email_verification: true,
            verification_token: None,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("verificationToken").is_none());
        assert_eq!(json["requiresEmailVerification"], true);
        assert_eq!(json["user"]["status"], "active");
    }
}
