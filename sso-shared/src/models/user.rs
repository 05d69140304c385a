/// User identity record
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id        INTEGER PRIMARY KEY AUTOINCREMENT,
///     email     TEXT    NOT NULL UNIQUE,
///     pass_hash BLOB    NOT NULL,
///     is_admin  BOOLEAN NOT NULL DEFAULT FALSE
/// );
/// ```
///
/// The admin flag is not part of [`User`]; it is answered separately by
/// [`UserDirectory::is_admin`](crate::storage::UserDirectory::is_admin).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered user
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID assigned by the directory
    pub id: i64,

    /// Email address, unique and case-sensitive as stored
    pub email: String,

    /// Opaque password hash produced by the credential hasher
    #[serde(skip_serializing)]
    pub pass_hash: Vec<u8>,
}

impl User {
    /// Creates a user record
    pub fn new(id: i64, email: impl Into<String>, pass_hash: Vec<u8>) -> Self {
        Self {
            id,
            email: email.into(),
            pass_hash,
        }
    }
}

// The hash stays out of logs.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("pass_hash", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_hash() {
        let user = User::new(1, "alice@example.com", b"$argon2id$secret".to_vec());
        let debug = format!("{:?}", user);

        assert!(debug.contains("alice@example.com"));
        assert!(!debug.contains("argon2id"));
    }

    #[test]
    fn test_serialize_skips_hash() {
        let user = User::new(7, "bob@example.com", b"hash".to_vec());
        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["email"], "bob@example.com");
        assert!(json.get("pass_hash").is_none());
    }
}
