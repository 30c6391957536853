use std::env;

use thiserror::Error;

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_HISTORY_LIMIT: i64 = 20;
/// The three onboarding prompts plus the two answers before the last one.
const MIN_HISTORY_LIMIT: i64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    MySql,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub apply_schema: bool,
    pub server_address: String,
    pub telegram_token: Option<String>,
    pub history_limit: i64,
}

impl Config {
    /// Reads the process environment, after `.env` has been loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store = match get("STORE").as_deref().map(str::trim) {
            None | Some("mysql") => StoreKind::MySql,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid { key: "STORE", value: other.to_string() })
            }
        };

        let database_url = get("DATABASE_URL");
        if store == StoreKind::MySql && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let max_connections = parse_or("DATABASE_MAX_CONNECTIONS", get("DATABASE_MAX_CONNECTIONS"), DEFAULT_MAX_CONNECTIONS)?;
        let history_limit = parse_or("BOT_HISTORY_LIMIT", get("BOT_HISTORY_LIMIT"), DEFAULT_HISTORY_LIMIT)?;
        if history_limit < MIN_HISTORY_LIMIT {
            return Err(ConfigError::Invalid {
                key: "BOT_HISTORY_LIMIT",
                value: history_limit.to_string(),
            });
        }
        let apply_schema = parse_or("APPLY_SCHEMA", get("APPLY_SCHEMA"), false)?;

        Ok(Config {
            store,
            database_url,
            max_connections,
            apply_schema,
            server_address: get("SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            telegram_token: get("TELEGRAM_BOT_TOKEN"),
            history_limit,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
