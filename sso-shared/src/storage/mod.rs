/// Storage contracts consumed by the authentication core
///
/// The core never talks to a concrete database. It depends on two
/// capabilities:
///
/// - [`UserDirectory`]: persist users, look them up by email, answer
///   admin-privilege queries
/// - [`AppRegistry`]: resolve an application ID to its descriptor
///
/// Both report failures through the closed [`StorageError`] enumeration, so
/// the service classifies outcomes by variant instead of by string or
/// identity comparison.
///
/// # Implementations
///
/// - [`memory::MemoryStore`]: in-process store for tests and demos
/// - [`sqlite::SqliteStore`]: sqlx-backed SQLite store
///
/// # Example
///
/// ```
/// use sso_shared::storage::{memory::MemoryStore, StorageError, UserDirectory};
///
/// # async fn example() -> Result<(), StorageError> {
/// let store = MemoryStore::new();
/// let id = store.save_user("alice@example.com", b"hash".to_vec()).await?;
///
/// let user = store.find_user_by_email("alice@example.com").await?;
/// assert_eq!(user.id, id);
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::models::{App, User};

/// Errors reported by storage collaborators
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A user with this email already exists
    #[error("user already exists")]
    UserExists,

    /// No user matches the lookup
    #[error("user not found")]
    UserNotFound,

    /// No application matches the lookup
    #[error("app not found")]
    AppNotFound,

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's deadline passed before the operation finished
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store cannot serve requests
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Whether this is one of the "no such record" variants
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::UserNotFound | StorageError::AppNotFound)
    }
}

/// Storage result type alias
pub type StorageResult<T> = Result<T, StorageError>;

/// User persistence and lookup
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Persists a new user and returns its assigned ID
    ///
    /// Returns [`StorageError::UserExists`] if the email is taken.
    async fn save_user(&self, email: &str, pass_hash: Vec<u8>) -> StorageResult<i64>;

    /// Looks a user up by exact email
    ///
    /// Returns [`StorageError::UserNotFound`] if there is none.
    async fn find_user_by_email(&self, email: &str) -> StorageResult<User>;

    /// Reports whether the user holds administrative privileges
    ///
    /// Returns [`StorageError::UserNotFound`] for an unknown ID.
    async fn is_admin(&self, user_id: i64) -> StorageResult<bool>;
}

/// Application lookup
#[async_trait]
pub trait AppRegistry: Send + Sync {
    /// Resolves an application by ID
    ///
    /// Returns [`StorageError::AppNotFound`] if there is none.
    async fn find_app(&self, app_id: i32) -> StorageResult<App>;
}
