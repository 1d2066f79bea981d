//! User lookup collaborator and secret verification.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// A user as seen by the password strategy.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    /// User ID.
    pub id: String,
    /// User email, the default login identifier.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// SHA-256 hex digest of the secret.
    pub password_hash: String,
}

impl UserRecord {
    /// Check a presented secret against the stored digest in constant time.
    pub fn verify_secret(&self, secret: &str) -> bool {
        let presented = hash_secret(secret);
        let stored = self.password_hash.trim().to_ascii_lowercase();
        presented.as_bytes().ct_eq(stored.as_bytes()).into()
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Hex SHA-256 digest of a secret, the stored form of user secrets.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("User store unavailable: {0}")]
    Unavailable(String),
}

/// Finds users by login identifier. Supplied by the host application.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserRecord>, LookupError>;
}

/// Users loaded from configuration, keyed by email.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: HashMap<String, UserRecord>,
}

impl InMemoryUserStore {
    pub fn new(users: Vec<UserRecord>) -> Self {
        let users = users
            .into_iter()
            .map(|u| (u.email.clone(), u))
            .collect();
        Self { users }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl UserLookup for InMemoryUserStore {
    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserRecord>, LookupError> {
        Ok(self.users.get(identifier).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(secret: &str) -> UserRecord {
        UserRecord {
            id: "user-1".to_string(),
            email: "a@b.com".to_string(),
            name: None,
            password_hash: hash_secret(secret),
        }
    }

    #[test]
    fn test_verify_secret() {
        let user = user("s3cr3t");
        assert!(user.verify_secret("s3cr3t"));
        assert!(!user.verify_secret("wrong"));
        assert!(!user.verify_secret(""));
    }

    #[test]
    fn test_stored_plaintext_never_matches() {
        let user = UserRecord {
            password_hash: "s3cr3t".to_string(),
            ..user("unused")
        };
        assert!(!user.verify_secret("s3cr3t"));
    }

    #[test]
    fn test_uppercase_digest_accepted() {
        let user = UserRecord {
            password_hash: hash_secret("s3cr3t").to_uppercase(),
            ..user("unused")
        };
        assert!(user.verify_secret("s3cr3t"));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let rendered = format!("{:?}", user("s3cr3t"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains(&hash_secret("s3cr3t")));
    }

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let store = InMemoryUserStore::new(vec![user("s3cr3t")]);
        assert_eq!(store.len(), 1);

        let found = store.find_user_by_identifier("a@b.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some("user-1".to_string()));

        let missing = store.find_user_by_identifier("x@y.com").await.unwrap();
        assert!(missing.is_none());
    }
}
