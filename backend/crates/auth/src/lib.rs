//! Auth (Credential & Session) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository/notifier traits
//! - `application/` - Use cases, token codec, session issuance
//! - `infra/` - PostgreSQL and in-memory repositories, notifier
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Email + password accounts with atomic user/credential creation
//! - Rotating refresh-token sessions with replay detection
//! - Short-lived signed access tokens (HS256 claims)
//! - Email verification and password reset via single-use tokens
//! - Append-only audit trail for every sensitive operation
//!
//! ## Security Model
//! - Passwords and refresh-token secrets hashed with Argon2id
//! - Refresh tokens are `id.secret` composites; only the secret's hash is stored
//! - Refresh rotation links old to new, so replay of a rotated token is detected
//! - Password reset revokes every live session of the account
//! - Login failures are indistinguishable for unknown email vs. wrong password

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::memory::MemoryAuthRepository;
pub use infra::notify::TracingNotifier;
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
