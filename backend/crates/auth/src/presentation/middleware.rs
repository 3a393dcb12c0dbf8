//! Access Token Middleware
//!
//! Transport-side verification of access tokens. The session service only
//! issues tokens; sibling routers mount this middleware to authenticate
//! requests with the shared signing secret and read the claims from request
//! extensions.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::tokens::TokenCodec;
use crate::error::AuthError;

/// Middleware state
#[derive(Clone)]
pub struct AuthMiddlewareState {
    codec: Arc<TokenCodec>,
    config: Arc<AuthConfig>,
}

impl AuthMiddlewareState {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self {
            codec: Arc::new(TokenCodec::new(&config)),
            config,
        }
    }
}

/// Middleware that requires a valid access token.
///
/// Accepts a bearer Authorization header or the access cookie. Verified
/// [`crate::application::tokens::AccessClaims`] are inserted into request
/// extensions for downstream handlers.
pub async fn require_access_token(
    State(state): State<AuthMiddlewareState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = bearer_token(req.headers()).or_else(|| {
        platform::cookie::extract_cookie(req.headers(), &state.config.access_cookie_name)
    });

    let Some(token) = token else {
        return Err(AuthError::InvalidAccessToken.into_response());
    };

    match state.codec.verify_access(&token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(e) => Err(e.into_response()),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}
