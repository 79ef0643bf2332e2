//! Configuration module for evguard-server.
//!
//! Handles loading configuration from the TOML file and applying CLI
//! overrides. The result is a [`RuntimeConfig`] handed to constructors.

pub mod file;

use crate::config::file::FileConfig;
use evguard_core::config::{RuntimeConfig, ServerConfig, SignalsConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file, or use defaults when it does not exist
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    pub fn load(&self) -> Result<RuntimeConfig, ConfigError> {
        let mut file_config = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => toml::from_str::<FileConfig>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %self.config_path.display(),
                    "Config file not found, using defaults"
                );
                FileConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;
        Ok(build_runtime_config(file_config))
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.signals.max_pending == Some(0) {
        return Err(ConfigError::ValidationError(
            "signals.max_pending must be at least 1 (omit it for an unbounded queue)".into(),
        ));
    }
    if config.signals.audit_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "signals.audit_capacity must be at least 1".into(),
        ));
    }
    Ok(())
}

fn build_runtime_config(file_config: FileConfig) -> RuntimeConfig {
    RuntimeConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        signals: SignalsConfig {
            max_pending: file_config.signals.max_pending,
            background_flush: file_config.signals.background_flush,
            audit_capacity: file_config.signals.audit_capacity,
        },
    }
}
