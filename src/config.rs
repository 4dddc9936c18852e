use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use http::HeaderValue;
use zeroize::Zeroizing;

/// Upper bound for `SESSION_DURATION_DAYS`, roughly ten years.
pub const MAX_SESSION_DURATION_DAYS: i64 = 3650;

/// Which user store backs the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// Relational store reached over the MySQL protocol.
    MySql,
    /// In-process map, lost on restart.
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::MySql),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("USER_STORE must be `mysql` or `memory`, got `{}`", other),
        }
    }
}

/// Connection settings for the MySQL user store.
#[derive(Clone)]
pub struct MySqlSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Zeroizing<String>,
    pub database: String,
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The user store backend.
    pub store_backend: StoreBackend,
    /// MySQL connection settings, used when `store_backend` is `MySql`.
    pub mysql: MySqlSettings,
    /// The duration of a session in days.
    pub session_duration_days: i64,
    /// Directory holding `index.html` and other static assets.
    pub static_dir: PathBuf,
    /// Origins allowed to make credentialed cross-origin requests.
    pub cors_origins: Vec<HeaderValue>,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a `Config` from an arbitrary key lookup, applying defaults for
    /// every missing key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let session_duration_days: i64 = var("SESSION_DURATION_DAYS", "7")
            .parse()
            .context("Invalid SESSION_DURATION_DAYS")?;
        if !(1..=MAX_SESSION_DURATION_DAYS).contains(&session_duration_days) {
            anyhow::bail!(
                "SESSION_DURATION_DAYS must be between 1 and {}",
                MAX_SESSION_DURATION_DAYS
            );
        }

        let cors_origins = var(
            "CORS_ORIGINS",
            "http://localhost:3000,http://127.0.0.1:3000",
        )
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            if origin == "*" {
                anyhow::bail!("CORS_ORIGINS cannot contain `*`; list each origin explicitly");
            }
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid origin in CORS_ORIGINS: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            bind_addr: var("BIND_ADDR", "127.0.0.1:3000")
                .parse()
                .context("Invalid BIND_ADDR")?,
            store_backend: StoreBackend::parse(&var("USER_STORE", "mysql"))?,
            mysql: MySqlSettings {
                host: var("MYSQL_HOST", "localhost"),
                port: var("MYSQL_PORT", "3306")
                    .parse()
                    .context("Invalid MYSQL_PORT")?,
                user: var("MYSQL_USER", "root"),
                password: Zeroizing::new(var("MYSQL_PASSWORD", "")),
                database: var("MYSQL_DB", "hk_reception"),
            },
            session_duration_days,
            static_dir: PathBuf::from(var("STATIC_DIR", "static")),
            cors_origins,
            secure_cookies: var("APP_ENV", "development") == "production",
        })
    }
}
