use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Moderator => write!(f, "moderator"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Caller identity, resolved once per session/request and passed down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub role: Role,
}

impl AuthContext {
    pub fn user() -> Self {
        Self { role: Role::User }
    }

    pub fn moderator() -> Self {
        Self { role: Role::Moderator }
    }

    pub fn admin() -> Self {
        Self { role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Moderators and admins.
    pub fn is_staff(&self) -> bool {
        self.role >= Role::Moderator
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::user()
    }
}
