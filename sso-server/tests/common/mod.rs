/// Shared helpers for server integration tests

use sso_server::config::{Config, Environment, LogFormat};
use sso_shared::auth::HasherConfig;
use sso_shared::services::AuthConfig;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Configuration with a cheap hasher so tests stay fast
pub fn test_config(storage_path: impl Into<String>) -> Config {
    Config {
        env: Environment::Local,
        storage_path: storage_path.into(),
        auth: AuthConfig::default(),
        hasher: HasherConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        request_timeout: Duration::from_secs(5),
        log_format: LogFormat::Pretty,
    }
}

/// A database path in a directory that does not exist yet
pub fn scratch_db_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    std::env::temp_dir()
        .join(format!("sso-test-{}-{}-{}", name, std::process::id(), nanos))
        .join("storage")
        .join("sso.db")
}
