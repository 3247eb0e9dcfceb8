// config.rs
use std::{env, fmt::Display, net::IpAddr, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
#[error("invalid value for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub store: StoreConfig,
    pub shutdown_grace: Duration,
}

impl Config {
    /// Reads configuration from the environment, after loading `.env` if one exists.
    pub fn load() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            info!("Loaded environment from .env");
        }

        Ok(Self {
            host: try_load("HOST", "0.0.0.0")?,
            port: try_load("PORT", "3001")?,
            store: StoreConfig {
                database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                max_connections: try_load("DATABASE_MAX_CONNECTIONS", "5")?,
                timeout: Duration::from_secs(try_load("DATABASE_TIMEOUT_SECS", "10")?),
            },
            shutdown_grace: Duration::from_secs(try_load("SHUTDOWN_GRACE_SECS", "5")?),
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError {
            key,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_falls_back_to_default() {
        let port: u16 = try_load("POLL_SERVICE_TEST_UNSET_PORT", "3001").unwrap();
        assert_eq!(port, 3001);
    }

    #[test]
    fn malformed_value_is_an_error() {
        env::set_var("POLL_SERVICE_TEST_BAD_PORT", "not-a-port");
        let err = try_load::<u16>("POLL_SERVICE_TEST_BAD_PORT", "3001").unwrap_err();
        assert_eq!(err.key, "POLL_SERVICE_TEST_BAD_PORT");
    }
}
