//! Credential Entity
//!
//! Password hash owned 1:1 by a User. Separated from the User entity to
//! isolate secret material; created in the same transaction as its owner.

use chrono::{DateTime, Utc};
use platform::password::SecretHash;

use crate::domain::value_object::ids::UserId;

/// Credential entity
#[derive(Debug, Clone)]
pub struct Credential {
    /// Reference to User
    pub user_id: UserId,
    /// Argon2id hash of the password (PHC string)
    pub password_hash: SecretHash,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Create a new credential
    pub fn new(user_id: UserId, password_hash: SecretHash) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the password hash (password reset)
    pub fn update_password(&mut self, new_hash: SecretHash) {
        self.password_hash = new_hash;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::Secret;

    #[test]
    fn test_update_password_replaces_hash() {
        let old_hash = Secret::new("OldPassword1!aa").hash().unwrap();
        let new_hash = Secret::new("NewPassword1!aa").hash().unwrap();

        let mut credential = Credential::new(UserId::new(), old_hash);
        credential.update_password(new_hash);

        assert!(
            credential
                .password_hash
                .verify(&Secret::new("NewPassword1!aa"))
        );
        assert!(
            !credential
                .password_hash
                .verify(&Secret::new("OldPassword1!aa"))
        );
    }
}
