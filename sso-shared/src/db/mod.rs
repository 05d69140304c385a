/// Database layer for the SQLite store
///
/// # Modules
///
/// - `pool`: SQLite connection pool management with health checks
/// - `migrations`: Embedded schema migrations
///
/// # Example
///
/// ```no_run
/// use sso_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::for_path("./storage/sso.db")).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
