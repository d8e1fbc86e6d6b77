//! Runtime configuration read from the environment (and `.env`).

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} is not valid: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Postgres connection string. Without it the service keeps everything in memory.
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub port: u16,
    /// Route prefix, e.g. `/api/v1`.
    pub api_url: String,
    /// Upper bound on every single store or price lookup call.
    pub store_timeout: Duration,
    pub db_max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            nats_url: None,
            port: 3000,
            api_url: "/api/v1".to_string(),
            store_timeout: Duration::from_millis(5_000),
            db_max_connections: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            nats_url: non_empty("NATS_URL"),
            port: parse(&lookup, "PORT")?.unwrap_or(defaults.port),
            api_url: non_empty("API_URL").map(|u| normalize_prefix(&u)).unwrap_or(defaults.api_url),
            store_timeout: parse(&lookup, "STORE_TIMEOUT_MS")?.map(Duration::from_millis).unwrap_or(defaults.store_timeout),
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS")?.unwrap_or(defaults.db_max_connections),
        })
    }
}

fn parse<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|_| ConfigError::Invalid { name, value }),
    }
}

/// `api/v1/` and `/api/v1` both become `/api/v1`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") }
}
