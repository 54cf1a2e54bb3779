use std::net::SocketAddr;
use thiserror::Error;

use crate::logging::LoggingConfig;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://crypto.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
// CoinGecko rejects requests that do not carry a User-Agent.
pub const DEFAULT_USER_AGENT: &str = "CryptoPriceTrackerApp/1.0";
pub const DEFAULT_COIN_COUNT: u32 = 10;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Quote currency for every upstream price request.
pub const VS_CURRENCY: &str = "usd";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("{key} must be set when {reason}")]
    Missing { key: &'static str, reason: &'static str },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub coingecko_base_url: String,
    pub user_agent: String,
    pub default_coin_count: u32,
    pub db_max_connections: u32,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so tests don't have to touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid { key: "BIND_ADDR", value: bind_addr.clone() })?;

        let default_coin_count = parse_positive(&lookup, "DEFAULT_COIN_COUNT", DEFAULT_COIN_COUNT)?;
        let db_max_connections = parse_positive(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;

        let logging = logging_from_lookup(&lookup)?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr,
            coingecko_base_url: lookup("COINGECKO_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_COINGECKO_BASE_URL.to_string()),
            user_agent: lookup("COINGECKO_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            default_coin_count,
            db_max_connections,
            logging,
        })
    }
}

fn logging_from_lookup<F>(lookup: &F) -> Result<LoggingConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = LoggingConfig::default();

    let loki_enabled = match lookup("LOKI_ENABLED") {
        None => defaults.loki_enabled,
        Some(raw) => raw
            .trim()
            .to_ascii_lowercase()
            .parse::<bool>()
            .map_err(|_| ConfigError::Invalid { key: "LOKI_ENABLED", value: raw.clone() })?,
    };

    let logging = LoggingConfig {
        log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        loki_enabled,
        loki_url: lookup("LOKI_URL").filter(|url| !url.trim().is_empty()),
        service_name: lookup("SERVICE_NAME").unwrap_or(defaults.service_name),
        environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
    };
    logging.validate()?;
    Ok(logging)
}

fn parse_positive<F>(lookup: &F, key: &'static str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
    }
}
