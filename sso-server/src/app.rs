/// Application bootstrap
///
/// Wires storage, hashing, token issuing and the authentication service
/// together from a [`Config`].
///
/// # Example
///
/// ```no_run
/// use sso_server::{app::App, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let app = App::new(config).await?;
///
/// let ctx = app.context();
/// let user_id = app.auth().register(&ctx, "alice@example.com", "s3cret!").await?;
///
/// app.shutdown().await;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use sso_shared::auth::{Argon2Hasher, JwtIssuer};
use sso_shared::context::CallContext;
use sso_shared::db::migrations::{run_migrations, MigrationOutcome};
use sso_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use sso_shared::services::AuthService;
use sso_shared::storage::sqlite::SqliteStore;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Bootstrap failures
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Storage directory could not be created
    #[error("failed to prepare storage directory {path}: {source}")]
    StorageDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Database could not be opened
    #[error("failed to open database: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("failed to migrate database: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Running application
pub struct App {
    auth: Arc<AuthService>,
    store: SqliteStore,
    config: Arc<Config>,
    shutdown: CancellationToken,
}

impl App {
    /// Opens storage, applies pending migrations and builds the service
    ///
    /// `":memory:"` as the storage path gives a private in-memory database.
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let db_config = database_config(&config.storage_path);

        if config.storage_path != ":memory:" {
            prepare_storage_dir(&config.storage_path).await?;
        }

        let pool = create_pool(db_config).await?;

        match run_migrations(&pool).await? {
            MigrationOutcome::Applied(n) => info!(applied = n, "Schema migrated"),
            MigrationOutcome::NoChange => info!("Schema up to date"),
        }

        let store = SqliteStore::new(pool);
        let shared = Arc::new(store.clone());

        let auth = AuthService::new(
            tracing::info_span!("auth", env = ?config.env),
            shared.clone(),
            shared,
            Arc::new(Argon2Hasher::new(config.hasher)),
            Arc::new(JwtIssuer),
            config.auth,
        );

        info!(
            storage_path = %config.storage_path,
            token_ttl_seconds = config.auth.token_ttl.as_secs(),
            "Application initialized"
        );

        Ok(Self {
            auth: Arc::new(auth),
            store,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        })
    }

    /// Authentication service
    pub fn auth(&self) -> &Arc<AuthService> {
        &self.auth
    }

    /// Backing store, for administrative operations such as app registration
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fresh call context bounded by the configured request timeout
    ///
    /// Contexts handed out here are cancelled by [`App::shutdown`].
    pub fn context(&self) -> CallContext {
        CallContext::from_token(self.shutdown.child_token())
            .child_with_timeout(self.config.request_timeout)
    }

    /// Cancels outstanding calls and closes the database pool
    pub async fn shutdown(self) {
        info!("Shutting down");
        self.shutdown.cancel();
        close_pool(self.store.pool().clone()).await;
    }
}

/// Pool configuration for a storage path
pub fn database_config(storage_path: &str) -> DatabaseConfig {
    if storage_path == ":memory:" {
        DatabaseConfig::in_memory()
    } else {
        DatabaseConfig::for_path(storage_path)
    }
}

async fn prepare_storage_dir(storage_path: &str) -> Result<(), AppError> {
    let parent = match Path::new(storage_path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };

    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|source| AppError::StorageDir {
            path: parent.display().to_string(),
            source,
        })
}
