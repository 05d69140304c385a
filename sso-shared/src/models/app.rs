/// Application (tenant/client) descriptor
///
/// Every session token is scoped to exactly one application and signed with
/// that application's secret.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE apps (
///     id     INTEGER PRIMARY KEY,
///     name   TEXT NOT NULL UNIQUE,
///     secret TEXT NOT NULL UNIQUE
/// );
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered application
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct App {
    /// Application ID
    pub id: i32,

    /// Human-readable name
    pub name: String,

    /// HMAC key for tokens issued to this application
    #[serde(skip_serializing)]
    pub secret: String,
}

impl App {
    /// Creates an application record
    pub fn new(id: i32, name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let app = App::new(1, "web", "top-secret");
        let debug = format!("{:?}", app);

        assert!(debug.contains("web"));
        assert!(!debug.contains("top-secret"));
    }
}
