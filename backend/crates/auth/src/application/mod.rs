//! Application Layer
//!
//! Use cases, configuration, and token primitives.

pub mod config;
pub mod issue_session;
pub mod password_reset;
pub mod refresh_session;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod tokens;
pub mod verify_email;

// Re-exports
pub use config::AuthConfig;
pub use issue_session::IssuedSession;
pub use password_reset::PasswordResetUseCase;
pub use refresh_session::{RefreshSessionInput, RefreshSessionOutput, RefreshSessionUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use tokens::{AccessClaims, TokenCodec};
pub use verify_email::VerifyEmailUseCase;
