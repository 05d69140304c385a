//! # SSO Migrator
//!
//! Applies pending schema migrations to the SSO database and exits.
//!
//! ## Usage
//!
//! ```bash
//! sso-migrator ./storage/sso.db
//! SSO_STORAGE_PATH=./storage/sso.db sso-migrator
//! ```

use anyhow::Context;
use sso_server::app::database_config;
use sso_shared::db::migrations::{run_migrations, MigrationOutcome};
use sso_shared::db::pool::{close_pool, create_pool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let storage_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SSO_STORAGE_PATH").ok())
        .filter(|path| !path.trim().is_empty())
        .context("storage path is required (argument or SSO_STORAGE_PATH)")?;

    let pool = create_pool(database_config(&storage_path))
        .await
        .with_context(|| format!("failed to open {}", storage_path))?;

    let outcome = run_migrations(&pool).await.context("migration failed")?;
    close_pool(pool).await;

    match outcome {
        MigrationOutcome::NoChange => println!("no migrations to apply"),
        MigrationOutcome::Applied(n) => println!("migrations applied successfully ({})", n),
    }

    Ok(())
}
