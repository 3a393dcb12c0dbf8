//! Audit Event Entity
//!
//! Append-only record written as a side effect of every sensitive
//! operation. Never mutated or read back by this subsystem.

use chrono::{DateTime, Utc};

use crate::domain::value_object::ids::{AuditEventId, UserId};

/// Audit event entity
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub event_id: AuditEventId,
    /// Action name, e.g. `auth.signup`
    pub action: String,
    /// Acting principal: a user id string, or [`AuditEvent::ACTOR_SYSTEM`]
    pub actor: String,
    /// Affected user, when known
    pub user_id: Option<UserId>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    /// Free-form structured context
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub const ACTOR_SYSTEM: &'static str = "system";

    /// Event acted by and affecting `user_id`
    pub fn for_user(action: impl Into<String>, user_id: UserId) -> Self {
        Self {
            event_id: AuditEventId::new(),
            action: action.into(),
            actor: user_id.to_string(),
            user_id: Some(user_id),
            client_ip: None,
            user_agent: None,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Event with no resolved user (e.g. logout, which never looks one up)
    pub fn system(action: impl Into<String>) -> Self {
        Self {
            event_id: AuditEventId::new(),
            action: action.into(),
            actor: Self::ACTOR_SYSTEM.to_string(),
            user_id: None,
            client_ip: None,
            user_agent: None,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Attach client metadata
    pub fn with_client(mut self, client_ip: Option<String>, user_agent: Option<String>) -> Self {
        self.client_ip = client_ip;
        self.user_agent = user_agent;
        self
    }

    /// Attach structured metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_for_user_sets_actor() {
        let user_id = UserId::new();
        let event = AuditEvent::for_user("auth.login", user_id);
        assert_eq!(event.actor, user_id.to_string());
        assert_eq!(event.user_id, Some(user_id));
    }

    #[test]
    fn test_system_event_has_no_user() {
        let event = AuditEvent::system("auth.logout");
        assert_eq!(event.actor, AuditEvent::ACTOR_SYSTEM);
        assert!(event.user_id.is_none());
    }

    #[test]
    fn test_builders() {
        let event = AuditEvent::system("auth.refresh")
            .with_client(Some("10.0.0.1".to_string()), Some("curl/8".to_string()))
            .with_metadata(json!({"replacedTokenId": "x"}));
        assert_eq!(event.client_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(event.metadata["replacedTokenId"], "x");
    }
}
