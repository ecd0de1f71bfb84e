//! Configuration management for pixelq
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use pixelq::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Lease duration: {}", config.ledger.lease_duration);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `PIXELQ__<section>__<key>`
//!
//! Examples:
//! - `PIXELQ__WORKER__COUNT=16`
//! - `PIXELQ__LEDGER__LEASE_DURATION=90s`
//! - `PIXELQ__LIMITS__MAX_UPLOAD_BYTES=20MB`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/pixelq.toml`.
//! This can be overridden using the `PIXELQ_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::{ByteSize, HumanDuration};
pub use models::{
    Config, DirectoryConfig, HttpConfig, LedgerConfig, Limits, ServerConfig, StorageConfig,
    StorageProvider, WorkerConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`PIXELQ__*`)
    /// 2. TOML file (default: `config/pixelq.toml`)
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Re-run validation after CLI overrides have been applied
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)?;
        Ok(())
    }
}
