// ============================================================================
// Courier Config - Centralized configuration management
// ============================================================================
//
// Loads the service configuration from environment variables (optionally
// seeded from a `.env` file) with sensible defaults.
//
// ============================================================================

mod constants;
mod database;
mod kafka;
mod logging;

pub use constants::MAX_MESSAGE_SIZE;
pub use database::DbConfig;
pub use kafka::{KafkaConfig, PayloadFormat};
pub use logging::{LogFormat, LoggingConfig};

use anyhow::Result;
use constants::*;
use std::str::FromStr;

/// Main configuration structure for the courier service
#[derive(Clone, Debug)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,

    pub port: u16,
    pub bind_address: String,

    /// Upper bound on draining in-flight HTTP requests at shutdown (seconds)
    pub shutdown_timeout_secs: u64,

    // Sub-configurations
    pub logging: LoggingConfig,
    pub db: DbConfig,
    pub kafka: KafkaConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let logging = LoggingConfig::from_env()?;
        let db = DbConfig::from_env()?;
        let kafka = KafkaConfig::from_env()?;

        let port = env_or("PORT", DEFAULT_PORT);

        Ok(Self {
            app_name: std::env::var("APP_NAME").unwrap_or_else(|_| DEFAULT_APP_NAME.to_string()),
            app_version: std::env::var("APP_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            port,
            bind_address: format!("[::]:{}", port),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            logging,
            db,
            kafka,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            port: DEFAULT_PORT,
            bind_address: format!("[::]:{}", DEFAULT_PORT),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            logging: LoggingConfig::default(),
            db: DbConfig::default(),
            kafka: KafkaConfig::default(),
        }
    }
}

/// Read `key` and parse it, falling back to `default` when the variable is
/// missing or does not parse.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(variable = key, value = %raw, "Unparsable value, using default");
                default
            }
        },
        Err(_) => default,
    }
}
