/// Tracing subscriber setup
///
/// Respects `RUST_LOG` if set; otherwise falls back to a level picked from
/// the deployment environment. Output goes to stdout, either human-readable
/// or as JSON lines.

use std::io;
use tracing_subscriber::EnvFilter;

use crate::config::{Environment, LogFormat};

/// Default filter directive for an environment
pub fn default_directive(env: Environment) -> &'static str {
    match env {
        Environment::Local => "sso_server=debug,sso_shared=debug,sso=debug",
        Environment::Dev => "sso_server=debug,sso_shared=debug,sso=debug,sqlx=warn",
        Environment::Prod => "info,sqlx=warn",
    }
}

/// Installs the global subscriber
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(env: Environment, format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(env)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stdout);

    let _ = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
