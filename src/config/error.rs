//! Configuration error types

use thiserror::Error;

/// Errors during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors during semantic configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(&'static str),

    #[error("DATABASE_URL must be a postgres:// or postgresql:// URL")]
    InvalidDatabaseUrl,

    #[error("min_connections must not exceed max_connections")]
    InvalidPoolSize,

    #[error("max_connections must not exceed 100")]
    PoolSizeTooLarge,

    #[error("SLA durations must be positive")]
    NonPositiveSlaDays,

    #[error("warning_days must be smaller than every phase SLA")]
    WarningWindowTooLarge,
}
