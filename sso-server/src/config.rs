/// Configuration management for the SSO server
///
/// This module loads configuration from environment variables (and a `.env`
/// file in development) into a type-safe struct.
///
/// # Environment Variables
///
/// - `SSO_ENV`: `local`, `dev` or `prod` (default: local)
/// - `SSO_STORAGE_PATH`: SQLite database file (required)
/// - `SSO_TOKEN_TTL`: Session token lifetime, e.g. `1h`, `30m` (default: 1h)
/// - `SSO_REQUEST_TIMEOUT`: Deadline applied to each service call (default: 10s)
/// - `SSO_ADMIN_NOT_FOUND_POLICY`: `user_not_found` or `invalid_application` (default: user_not_found)
/// - `SSO_HASH_MEMORY_KIB`, `SSO_HASH_ITERATIONS`, `SSO_HASH_PARALLELISM`: Argon2id work factor
/// - `SSO_LOG_FORMAT`: `pretty` or `json` (default: pretty)
/// - `RUST_LOG`: Log filter override
///
/// # Example
///
/// ```no_run
/// use sso_server::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Storage at {}", config.storage_path);
/// # Ok(())
/// # }
/// ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sso_shared::auth::HasherConfig;
use sso_shared::services::auth::{AuthConfig, NotFoundPolicy, DEFAULT_TOKEN_TTL};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default per-call deadline
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Developer machine
    #[default]
    Local,

    /// Shared development deployment
    Dev,

    /// Production
    Prod,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => anyhow::bail!("unknown environment: {}", other),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,

    /// JSON lines
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("unknown log format: {}", other),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment
    pub env: Environment,

    /// SQLite database file
    pub storage_path: String,

    /// Authentication policy
    pub auth: AuthConfig,

    /// Argon2id work factor
    pub hasher: HasherConfig,

    /// Deadline applied to each service call
    pub request_timeout: Duration,

    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `SSO_STORAGE_PATH` is missing or any variable has
    /// an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("SSO_ENV") {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };

        let storage_path = lookup("SSO_STORAGE_PATH")
            .filter(|path| !path.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("SSO_STORAGE_PATH environment variable is required"))?;

        let token_ttl = match lookup("SSO_TOKEN_TTL") {
            Some(value) => parse_duration(&value)?,
            None => DEFAULT_TOKEN_TTL,
        };
        if token_ttl.is_zero() {
            anyhow::bail!("SSO_TOKEN_TTL must be greater than zero");
        }
        chrono::Duration::from_std(token_ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| anyhow::anyhow!("SSO_TOKEN_TTL is out of range"))?;

        let request_timeout = match lookup("SSO_REQUEST_TIMEOUT") {
            Some(value) => parse_duration(&value)?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };
        if request_timeout.is_zero() {
            anyhow::bail!("SSO_REQUEST_TIMEOUT must be greater than zero");
        }

        let admin_not_found = match lookup("SSO_ADMIN_NOT_FOUND_POLICY") {
            Some(value) => value.parse::<NotFoundPolicy>().map_err(anyhow::Error::msg)?,
            None => NotFoundPolicy::default(),
        };

        let defaults = HasherConfig::default();
        let hasher = HasherConfig {
            memory_kib: parse_or(&lookup, "SSO_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "SSO_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&lookup, "SSO_HASH_PARALLELISM", defaults.parallelism)?,
        };

        let log_format = match lookup("SSO_LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            env,
            storage_path,
            auth: AuthConfig {
                token_ttl,
                admin_not_found,
            },
            hasher,
            request_timeout,
            log_format,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value: {}", key, e)),
        None => Ok(default),
    }
}

/// Parses durations like `1h`, `30m`, `15s`, `500ms` or bare seconds
pub fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);

    let amount: u64 = number
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid duration: {:?}", value))?;

    if unit.trim() == "ms" {
        return Ok(Duration::from_millis(amount));
    }

    let multiplier: u64 = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        other => anyhow::bail!("invalid duration unit {:?} in {:?}", other, value),
    };

    let seconds = amount
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("duration out of range: {:?}", value))?;

    Ok(Duration::from_secs(seconds))
}
