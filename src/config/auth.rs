use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::AuthContext;

/// Credentials accepted in the `x-admin-key` header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub admin_keys: Vec<String>,
    #[serde(default)]
    pub moderator_keys: Vec<String>,
}

fn digest(s: &str) -> [u8; 32] {
    Sha256::digest(s.as_bytes()).into()
}

impl AuthSettings {
    /// `None` when a credential was presented but matches nothing.
    pub fn resolve(&self, presented: Option<&str>) -> Option<AuthContext> {
        let Some(presented) = presented else {
            return Some(AuthContext::user());
        };

        let presented = digest(presented.trim());
        let matches = |keys: &[String]| keys.iter().any(|k| digest(k) == presented);

        if matches(&self.admin_keys) {
            Some(AuthContext::admin())
        } else if matches(&self.moderator_keys) {
            Some(AuthContext::moderator())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn settings() -> AuthSettings {
        AuthSettings {
            admin_keys: vec!["admin-secret".to_string()],
            moderator_keys: vec!["mod-secret".to_string()],
        }
    }

    #[test]
    fn test_resolve_roles() {
        let auth = settings();
        assert_eq!(auth.resolve(None).unwrap().role, Role::User);
        assert_eq!(auth.resolve(Some("admin-secret")).unwrap().role, Role::Admin);
        assert_eq!(auth.resolve(Some("mod-secret")).unwrap().role, Role::Moderator);
        assert!(auth.resolve(Some("guess")).is_none());
    }

    #[test]
    fn test_staff_flags() {
        let auth = settings();
        assert!(auth.resolve(Some("mod-secret")).unwrap().is_staff());
        assert!(!auth.resolve(Some("mod-secret")).unwrap().is_admin());
        assert!(!auth.resolve(None).unwrap().is_staff());
    }
}
