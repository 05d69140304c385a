//! # SSO Server
//!
//! Authentication core for single sign-on: credential checks, account
//! registration and admin-privilege queries, with HS256 session tokens
//! scoped to the requesting application.
//!
//! ## Usage
//!
//! ```bash
//! SSO_STORAGE_PATH=./storage/sso.db cargo run -p sso-server --bin sso
//! ```

use sso_server::{app::App, config::Config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    telemetry::init(config.env, config.log_format);

    tracing::info!(
        env = ?config.env,
        "SSO Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let app = App::new(config).await?;

    tracing::info!("Server ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, exiting...");

    app.shutdown().await;

    Ok(())
}
