//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::telemetry::LogFormat;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Kafka bootstrap servers
    pub kafka_brokers: String,

    /// Kafka client id
    pub kafka_client_id: String,

    /// Interval between history reconciliation runs
    pub reconcile_interval: Duration,

    /// Environment (development, production)
    pub environment: String,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let kafka_brokers = lookup("KAFKA_BROKERS").unwrap_or_else(|| "localhost:9092".to_string());

        let kafka_client_id =
            lookup("KAFKA_CLIENT_ID").unwrap_or_else(|| "point-ledger".to_string());

        let reconcile_secs: u64 = lookup("RECONCILE_INTERVAL_SECS")
            .unwrap_or_else(|| "300".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("RECONCILE_INTERVAL_SECS"))?;
        if reconcile_secs == 0 {
            return Err(ConfigError::InvalidValue("RECONCILE_INTERVAL_SECS"));
        }

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let log_format = lookup("LOG_FORMAT")
            .unwrap_or_else(|| "text".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("LOG_FORMAT"))?;

        Ok(Self {
            database_url,
            database_max_connections,
            kafka_brokers,
            kafka_client_id,
            reconcile_interval: Duration::from_secs(reconcile_secs),
            environment,
            log_format,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
