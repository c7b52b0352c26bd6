//! Service configuration loaded from the environment.
//!
//! The webhook secret is the only required setting: the service refuses to
//! start without one, since an empty secret would make every signature
//! verifiable. Everything else has a default suitable for local runs.

use thiserror::Error;

/// Default page size for `GET /messages` when `limit` is absent.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Default ceiling for `limit`; requests above it are rejected.
pub const DEFAULT_MAX_PAGE_SIZE: i64 = 100;

/// How many senders the stats view reports.
pub const TOP_SENDERS: i64 = 10;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The webhook secret is missing or empty.
    #[error("WEBHOOK_SECRET is not set")]
    MissingSecret,

    /// A numeric variable could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret for webhook signature verification.
    pub webhook_secret: Vec<u8>,

    /// Database URL, e.g. `sqlite:data/inbox.db`.
    pub database_url: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Upper bound for the `limit` query parameter.
    pub max_page_size: i64,

    /// Page size used when `limit` is absent.
    pub default_page_size: i64,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Config, ConfigError> {
        let webhook_secret = std::env::var("WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?
            .into_bytes();

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/inbox.db".to_string());

        let port = parse_var("PORT", 8000)?;
        let max_page_size = parse_var("MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?;
        let default_page_size = parse_var("DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;

        Ok(Config {
            webhook_secret,
            database_url,
            port,
            max_page_size,
            default_page_size,
        })
    }
}

/// Parses an optional numeric environment variable, falling back to a default.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        Err(_) => Ok(default),
    }
}
