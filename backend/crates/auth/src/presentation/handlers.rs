//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse};
use chrono::Utc;
use std::sync::Arc;

use platform::client::extract_client_info;
use platform::cookie::{CookieConfig, extract_cookie};

use crate::application::config::AuthConfig;
use crate::application::issue_session::IssuedSession;
use crate::application::{
    PasswordResetUseCase, RefreshSessionInput, RefreshSessionUseCase, SignInInput, SignInUseCase,
    SignOutUseCase, SignUpInput, SignUpUseCase, VerifyEmailUseCase,
};
use crate::domain::notifier::Notifier;
use crate::domain::repository::{
    AuditRepository, OneTimeTokenRepository, RefreshTokenRepository, UserRepository,
};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    RefreshRequest, RefreshResponse, ResetPasswordRequest, ResetRequestRequest,
    ResetRequestedResponse, SessionDto, SignInRequest, SignInResponse, SignOutRequest,
    SignUpRequest, SignUpResponse, UserDto, UserResponse, VerifyEmailRequest,
};

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R, N>
where
    R: UserRepository
        + RefreshTokenRepository
        + OneTimeTokenRepository
        + AuditRepository
        + Clone
        + Send
        + Sync
        + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub notifier: Arc<N>,
    pub config: Arc<AuthConfig>,
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<R, N>(
    State(state): State<AuthAppState<R, N>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository
        + RefreshTokenRepository
        + OneTimeTokenRepository
        + AuditRepository
        + Clone
        + Send
        + Sync
        + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    req.validate()?;

    let client = extract_client_info(&headers, Some(addr.ip()));
    let use_case = SignUpUseCase::new(
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(SignUpInput {
            email: req.email,
            password: req.password,
            accept_terms: req.accept_terms,
            display_name: req.display_name,
            timezone: req.timezone,
            client,
        })
        .await?;

    let cookies = set_session_cookies(&state.config, &output.session);
    let body = SignUpResponse {
        user: UserDto::from(&output.user),
        session: SessionDto::from(&output.session),
        requires_email_verification: true,
        verification_token: state
            .config
            .debug_tokens
            .then_some(output.verification_token),
    };

    Ok((StatusCode::CREATED, cookies, Json(body)))
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/login
pub async fn sign_in<R, N>(
    State(state): State<AuthAppState<R, N>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository
        + RefreshTokenRepository
        + OneTimeTokenRepository
        + AuditRepository
        + Clone
        + Send
        + Sync
        + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let client = extract_client_info(&headers, Some(addr.ip()));
    let use_case = SignInUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
            remember_me: req.remember_me,
            client,
        })
        .await?;

    let cookies = set_session_cookies(&state.config, &output.session);
    let body = SignInResponse {
        email_verified: output.user.email_verified(),
        user: UserDto::from(&output.user),
        session: SessionDto::from(&output.session),
    };

    Ok((StatusCode::OK, cookies, Json(body)))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/auth/refresh
///
/// Token arrives in the body or in the httpOnly refresh cookie.
pub async fn refresh<R, N>(
    State(state): State<AuthAppState<R, N>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    body: Option<Json<RefreshRequest>>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository
        + RefreshTokenRepository
        + OneTimeTokenRepository
        + AuditRepository
        + Clone
        + Send
        + Sync
        + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let refresh_token = body
        .and_then(|Json(req)| req.refresh_token)
        .or_else(|| extract_cookie(&headers, &state.config.refresh_cookie_name))
        .ok_or(AuthError::InvalidRefreshToken)?;

    let client = extract_client_info(&headers, Some(addr.ip()));
    let use_case = RefreshSessionUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(RefreshSessionInput {
            refresh_token,
            client,
        })
        .await?;

    let cookies = set_session_cookies(&state.config, &output.session);
    let body = RefreshResponse {
        user: UserDto::from(&output.user),
        session: SessionDto::from(&output.session),
    };

    Ok((StatusCode::OK, cookies, Json(body)))
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/auth/logout
///
/// Always 204, always clears both cookies; revocation is best effort.
pub async fn sign_out<R, N>(
    State(state): State<AuthAppState<R, N>>,
    headers: HeaderMap,
    body: Option<Json<SignOutRequest>>,
) -> impl IntoResponse
where
    R: UserRepository
        + RefreshTokenRepository
        + OneTimeTokenRepository
        + AuditRepository
        + Clone
        + Send
        + Sync
        + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let refresh_token = body
        .and_then(|Json(req)| req.refresh_token)
        .or_else(|| extract_cookie(&headers, &state.config.refresh_cookie_name));

    let use_case = SignOutUseCase::new(state.repo.clone());
    use_case.execute(refresh_token.as_deref()).await;

    (StatusCode::NO_CONTENT, clear_session_cookies(&state.config))
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /api/auth/password/reset-request
///
/// 202 with `{requested: true}` no matter whether the email exists.
pub async fn reset_request<R, N>(
    State(state): State<AuthAppState<R, N>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<ResetRequestRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository
        + RefreshTokenRepository
        + OneTimeTokenRepository
        + AuditRepository
        + Clone
        + Send
        + Sync
        + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let client = extract_client_info(&headers, Some(addr.ip()));
    let use_case = PasswordResetUseCase::new(
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    use_case.request(&req.email, &client).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ResetRequestedResponse { requested: true }),
    ))
}

/// POST /api/auth/password/reset
///
/// Clears cookies on success: every session was just revoked, the client
/// must log in again.
pub async fn reset_password<R, N>(
    State(state): State<AuthAppState<R, N>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository
        + RefreshTokenRepository
        + OneTimeTokenRepository
        + AuditRepository
        + Clone
        + Send
        + Sync
        + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    req.validate()?;

    let client = extract_client_info(&headers, Some(addr.ip()));
    let use_case = PasswordResetUseCase::new(
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let user = use_case
        .reset(&req.token, req.new_password, &client)
        .await?;

    Ok((
        StatusCode::OK,
        clear_session_cookies(&state.config),
        Json(UserResponse {
            user: UserDto::from(&user),
        }),
    ))
}

// ============================================================================
// Email Verification
// ============================================================================

/// POST /api/auth/email/verify
pub async fn verify_email<R, N>(
    State(state): State<AuthAppState<R, N>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<VerifyEmailRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository
        + RefreshTokenRepository
        + OneTimeTokenRepository
        + AuditRepository
        + Clone
        + Send
        + Sync
        + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let client = extract_client_info(&headers, Some(addr.ip()));
    let use_case = VerifyEmailUseCase::new(state.repo.clone());

    let user = use_case.execute(&req.token, &client).await?;

    Ok((
        StatusCode::OK,
        Json(UserResponse {
            user: UserDto::from(&user),
        }),
    ))
}

// ============================================================================
// Cookie helpers
// ============================================================================

fn cookie_config(config: &AuthConfig, name: &str, max_age_secs: Option<i64>) -> CookieConfig {
    CookieConfig {
        name: name.to_string(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: "/".to_string(),
        domain: config.cookie_domain.clone(),
        max_age_secs,
    }
}

/// Both session cookies, Max-Age pinned to each token's remaining lifetime
fn set_session_cookies(
    config: &AuthConfig,
    session: &IssuedSession,
) -> AppendHeaders<[(header::HeaderName, String); 2]> {
    let now = Utc::now();
    let access_remaining = (session.access_expires_at - now).num_seconds().max(0);
    let refresh_remaining = (session.refresh_expires_at - now).num_seconds().max(0);

    let access = cookie_config(config, &config.access_cookie_name, Some(access_remaining))
        .build_set_cookie(&session.access_token);
    let refresh = cookie_config(config, &config.refresh_cookie_name, Some(refresh_remaining))
        .build_set_cookie(&session.refresh_token);

    AppendHeaders([
        (header::SET_COOKIE, access),
        (header::SET_COOKIE, refresh),
    ])
}

fn clear_session_cookies(
    config: &AuthConfig,
) -> AppendHeaders<[(header::HeaderName, String); 2]> {
    let access = cookie_config(config, &config.access_cookie_name, None).build_delete_cookie();
    let refresh = cookie_config(config, &config.refresh_cookie_name, None).build_delete_cookie();

    AppendHeaders([
        (header::SET_COOKIE, access),
        (header::SET_COOKIE, refresh),
    ])
}
