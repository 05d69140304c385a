/// SQLite-backed storage
///
/// Implements [`UserDirectory`] and [`AppRegistry`] on top of an sqlx
/// [`SqlitePool`]. The schema comes from the `migrations/` directory (see
/// [`crate::db::migrations`]).
///
/// Email uniqueness is enforced by the `users.email` UNIQUE constraint, so
/// concurrent registrations of the same address race at the database and the
/// loser gets [`StorageError::UserExists`].
///
/// # Example
///
/// ```no_run
/// use sso_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
/// use sso_shared::storage::{sqlite::SqliteStore, UserDirectory};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::for_path("./storage/sso.db")).await?;
/// run_migrations(&pool).await?;
///
/// let store = SqliteStore::new(pool);
/// let id = store.save_user("alice@example.com", b"$argon2id$...".to_vec()).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use super::{AppRegistry, StorageError, StorageResult, UserDirectory};
use crate::models::{App, User};

/// User directory and application registry over SQLite
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wraps an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Provisions an application
    ///
    /// Applications are managed out of band; this exists for bootstrap
    /// tooling and tests.
    pub async fn create_app(&self, name: &str, secret: &str) -> StorageResult<App> {
        let app = sqlx::query_as::<_, App>(
            "INSERT INTO apps (name, secret) VALUES (?, ?) RETURNING id, name, secret",
        )
        .bind(name)
        .bind(secret)
        .fetch_one(&self.pool)
        .await?;

        debug!(app_id = app.id, name = %app.name, "Created app");
        Ok(app)
    }

    /// Sets the admin flag of an existing user
    pub async fn set_admin(&self, user_id: i64, is_admin: bool) -> StorageResult<()> {
        let result = sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
            .bind(is_admin)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::UserNotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqliteStore {
    async fn save_user(&self, email: &str, pass_hash: Vec<u8>) -> StorageResult<i64> {
        let result = sqlx::query("INSERT INTO users (email, pass_hash) VALUES (?, ?)")
            .bind(email)
            .bind(pass_hash)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StorageError::UserExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<User> {
        sqlx::query_as::<_, User>("SELECT id, email, pass_hash FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::UserNotFound)
    }

    async fn is_admin(&self, user_id: i64) -> StorageResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT is_admin FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::UserNotFound)
    }
}

#[async_trait]
impl AppRegistry for SqliteStore {
    async fn find_app(&self, app_id: i32) -> StorageResult<App> {
        sqlx::query_as::<_, App>("SELECT id, name, secret FROM apps WHERE id = ?")
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::AppNotFound)
    }
}
