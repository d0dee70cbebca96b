//! TOML configuration parsing and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::environment::EnvironmentLoader;
use crate::storage::{
    EntityStorage, StorageBackendBuilder, StorageOptions, StorageResult, DEFAULT_DATABASE_NAME,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Storage backend selection and connection
    #[serde(default)]
    pub storage: StorageConfig,
    /// Log level for the tracing subscriber
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Entity storage configuration (`[storage]` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend type: "mongodb", "documentdb" or "memory"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Connection string, opaque to this crate
    #[serde(default = "default_url")]
    pub url: String,
    /// Database name; empty selects "goworld"
    #[serde(default)]
    pub database: String,
    /// Bound for connecting, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub connect_timeout_seconds: u64,
    /// Bound for each storage operation, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub operation_timeout_seconds: u64,
    /// Application name reported to the server
    pub app_name: Option<String>,
}

fn default_backend() -> String {
    "mongodb".to_string()
}

fn default_url() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_url(),
            database: String::new(),
            connect_timeout_seconds: default_timeout_seconds(),
            operation_timeout_seconds: default_timeout_seconds(),
            app_name: None,
        }
    }
}

impl StorageConfig {
    /// Database the backend will select.
    pub fn database_name(&self) -> &str {
        if self.database.is_empty() {
            DEFAULT_DATABASE_NAME
        } else {
            &self.database
        }
    }

    /// Connection and operation bounds.
    pub fn options(&self) -> StorageOptions {
        StorageOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_seconds),
            operation_timeout: Duration::from_secs(self.operation_timeout_seconds),
            app_name: self.app_name.clone(),
        }
    }

    /// Override fields with values present in the environment.
    pub fn apply_env(&mut self, env: &EnvironmentLoader) {
        if let Some(backend) = env.storage_backend() {
            self.backend = backend;
        }
        if let Some(url) = env.storage_url() {
            self.url = url;
        }
        if let Some(database) = env.storage_database() {
            self.database = database;
        }
    }

    /// Builder preloaded with this configuration.
    pub fn builder(&self) -> StorageBackendBuilder {
        StorageBackendBuilder::new(&self.backend)
            .with_url(&self.url)
            .with_database(&self.database)
            .with_options(self.options())
    }
}

/// Open the backend selected by `config`.
///
/// Fails with [`StorageError::Configuration`](crate::storage::StorageError::Configuration)
/// for an unknown backend or a zero timeout, otherwise with whatever the
/// backend's open reports.
pub async fn open_storage(config: &StorageConfig) -> StorageResult<Box<dyn EntityStorage>> {
    config.builder().build().await
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. "info" or "entity_storage=debug"
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Loads and manages TOML configuration.
#[derive(Debug)]
pub struct ConfigurationLoader {
    /// File the configuration was read from (may not exist)
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: Configuration,
}

impl ConfigurationLoader {
    /// Initialize configuration loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None or missing, uses default config.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("config/storage.toml"));

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            Configuration::default()
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Configuration> {
        toml::from_str(content).context("Failed to parse TOML config")
    }

    /// Load configuration from TOML file.
    fn load_config(path: &Path) -> Result<Configuration> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Apply environment overrides to the loaded configuration.
    pub fn with_env(mut self, env: &EnvironmentLoader) -> Self {
        self.config.storage.apply_env(env);
        self
    }
}
