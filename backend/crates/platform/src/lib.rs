//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Secret hashing (Argon2id) for passwords and token secrets
//! - Password complexity policy
//! - Opaque token material generation
//! - Cookie management
//! - Client ip/user-agent capture

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
