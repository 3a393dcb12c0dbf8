//! Auth Router

use axum::{Router, routing::post};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::notifier::Notifier;
use crate::domain::repository::{
    AuditRepository, OneTimeTokenRepository, RefreshTokenRepository, UserRepository,
};
use crate::infra::notify::TracingNotifier;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};

/// Create the auth router with the PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, notifier: TracingNotifier, config: AuthConfig) -> Router {
    auth_router_generic(repo, notifier, config)
}

/// Create an auth router for any repository/notifier implementation
pub fn auth_router_generic<R, N>(repo: R, notifier: N, config: AuthConfig) -> Router
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
    let state = AuthAppState {
        repo: Arc::new(repo),
        notifier: Arc::new(notifier),
        config: Arc::new(config),
    };

    Router::new()
        .route("/signup", post(handlers::sign_up::<R, N>))
        .route("/login", post(handlers::sign_in::<R, N>))
        .route("/refresh", post(handlers::refresh::<R, N>))
        .route("/logout", post(handlers::sign_out::<R, N>))
        .route("/password/reset-request", post(handlers::reset_request::<R, N>))
        .route("/password/reset", post(handlers::reset_password::<R, N>))
        .route("/email/verify", post(handlers::verify_email::<R, N>))
        .with_state(state)
}
