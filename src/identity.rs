//! Identity adapter
//!
//! The core only needs a stable user id plus display name and email,
//! obtained once per session from an external identity provider. No
//! credential or token handling happens here.

use serde::{Deserialize, Serialize};

/// The identity fields the core consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

/// Source of the currently signed-in user
pub trait Identity: Send + Sync {
    fn current_user(&self) -> Option<SessionUser>;
}

/// Fixed identity for the local binary and tests
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<SessionUser>,
}

impl StaticIdentity {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user: Some(SessionUser {
                user_id: user_id.into(),
                name: name.into(),
                email: email.into(),
            }),
        }
    }

    /// Read the session user from TWENTYFIVE_USER_ID / _USER_NAME /
    /// _USER_EMAIL. Returns a signed-out identity when the id is unset.
    pub fn from_env() -> Self {
        match std::env::var("TWENTYFIVE_USER_ID") {
            Ok(user_id) if !user_id.trim().is_empty() => Self {
                user: Some(SessionUser {
                    user_id,
                    name: std::env::var("TWENTYFIVE_USER_NAME").unwrap_or_else(|_| "User".into()),
                    email: std::env::var("TWENTYFIVE_USER_EMAIL").unwrap_or_default(),
                }),
            },
            _ => Self { user: None },
        }
    }
}

impl Identity for StaticIdentity {
    fn current_user(&self) -> Option<SessionUser> {
        self.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_identity() {
        let identity = StaticIdentity::new("u1", "Alice", "alice@example.com");
        let session = identity.current_user().unwrap();
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.name, "Alice");
    }

    #[test]
    fn test_signed_out_identity() {
        let identity = StaticIdentity::default();
        assert!(identity.current_user().is_none());
    }
}
