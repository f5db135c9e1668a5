//! Authenticated identity: user record, role and session pair.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::UserId;

/// Role identifier as reported by the backend.
///
/// Roles are opaque strings at this layer; the backend decides what they allow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.0.eq_ignore_ascii_case("admin")
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::new("user")
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// User record returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub username: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl User {
    /// Name to greet the user with.
    pub fn display(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// Login form input.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.username.trim().is_empty() {
            return Err(DomainError::validation("username", "username is required"));
        }
        if self.password.is_empty() {
            return Err(DomainError::validation("password", "password is required"));
        }
        Ok(())
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer token plus the user it belongs to.
///
/// Both halves live and die together: a session never exists with an empty token.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> DomainResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DomainError::invariant("session token must not be empty"));
        }
        Ok(Self { token, user })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: None,
            username: "t".to_string(),
            role: Role::default(),
            display_name: None,
        }
    }

    #[test]
    fn session_requires_token() {
        assert!(Session::new("", user()).is_err());
        assert!(Session::new("  ", user()).is_err());
        let s = Session::new("abc", user()).unwrap();
        assert_eq!(s.token(), "abc");
    }

    #[test]
    fn session_debug_hides_token() {
        let s = Session::new("secret-token", user()).unwrap();
        assert!(!format!("{s:?}").contains("secret-token"));
    }

    #[test]
    fn minimal_user_json_decodes() {
        let u: User = serde_json::from_str(r#"{"username":"t"}"#).unwrap();
        assert_eq!(u.role, Role::new("user"));
        assert_eq!(u.display(), "t");
    }

    #[test]
    fn credentials_require_both_fields() {
        assert_eq!(
            Credentials::new("", "pw").validate().unwrap_err().field(),
            Some("username")
        );
        assert_eq!(
            Credentials::new("t", "").validate().unwrap_err().field(),
            Some("password")
        );
    }
}
