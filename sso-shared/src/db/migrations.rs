/// Database migration runner
///
/// Migrations live in the `migrations/` directory at the workspace root and
/// are embedded into the binary at compile time.
///
/// # Example
///
/// ```no_run
/// use sso_shared::db::pool::{create_pool, DatabaseConfig};
/// use sso_shared::db::migrations::{run_migrations, MigrationOutcome};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::for_path("./storage/sso.db")).await?;
///
///     match run_migrations(&pool).await? {
///         MigrationOutcome::Applied(n) => println!("applied {} migrations", n),
///         MigrationOutcome::NoChange => println!("no migrations to apply"),
///     }
///     Ok(())
/// }
/// ```

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Result of a migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// This many migrations were applied
    Applied(usize),

    /// Schema was already up to date
    NoChange,
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Number of migrations that have been applied
    pub applied_migrations: usize,

    /// Number of migrations embedded in this build
    pub known_migrations: usize,

    /// Latest applied migration version
    pub latest_version: Option<i64>,

    /// Whether the database schema is up to date
    pub is_up_to_date: bool,
}

/// Runs all pending database migrations
///
/// # Errors
///
/// Returns an error if a migration fails or the database was migrated by a
/// build with a conflicting history
pub async fn run_migrations(pool: &SqlitePool) -> Result<MigrationOutcome, sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let before = applied_count(pool)
        .await
        .map_err(sqlx::migrate::MigrateError::Execute)?;

    if let Err(e) = MIGRATOR.run(pool).await {
        warn!("Migration failed: {}", e);
        return Err(e);
    }

    let after = applied_count(pool).await.map_err(sqlx::migrate::MigrateError::Execute)?;

    let outcome = match after.saturating_sub(before) {
        0 => MigrationOutcome::NoChange,
        n => MigrationOutcome::Applied(n),
    };

    info!(?outcome, "Database migrations completed");
    Ok(outcome)
}

/// Gets the current migration status
pub async fn get_migration_status(pool: &SqlitePool) -> Result<MigrationStatus, sqlx::Error> {
    debug!("Checking migration status");

    let known_migrations = MIGRATOR.iter().count();

    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    if tables == 0 {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            known_migrations,
            latest_version: None,
            is_up_to_date: known_migrations == 0,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = 1",
    )
    .fetch_one(pool)
    .await?;

    debug!(
        applied_migrations = count,
        latest_version = ?latest_version,
        "Migration status retrieved"
    );

    Ok(MigrationStatus {
        applied_migrations: count as usize,
        known_migrations,
        latest_version,
        is_up_to_date: count as usize >= known_migrations,
    })
}

async fn applied_count(pool: &SqlitePool) -> Result<usize, sqlx::Error> {
    get_migration_status(pool)
        .await
        .map(|status| status.applied_migrations)
}
