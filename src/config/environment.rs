//! Environment variable loading and management.
//!
//! Deployment-specific storage settings (connection string with credentials,
//! database name) usually come from the environment rather than from the
//! checked-in TOML file.

use std::env;
use std::path::Path;

/// Selects the storage backend ("mongodb", "documentdb", "memory").
pub const STORAGE_BACKEND_VAR: &str = "ENTITY_STORAGE_BACKEND";
/// Connection string override.
pub const STORAGE_URL_VAR: &str = "ENTITY_STORAGE_URL";
/// Database name override.
pub const STORAGE_DATABASE_VAR: &str = "ENTITY_STORAGE_DATABASE";

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<String>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to .env file. Only an explicit path is loaded.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    tracing::warn!("Failed to load .env file {}: {}", path.display(), e);
                }
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
        }
    }

    /// Path of the loaded .env file, if any
    pub fn env_file(&self) -> Option<&str> {
        self.env_file.as_deref()
    }

    /// Backend type override
    pub fn storage_backend(&self) -> Option<String> {
        non_empty_var(STORAGE_BACKEND_VAR)
    }

    /// Connection string override
    pub fn storage_url(&self) -> Option<String> {
        non_empty_var(STORAGE_URL_VAR)
    }

    /// Database name override
    pub fn storage_database(&self) -> Option<String> {
        non_empty_var(STORAGE_DATABASE_VAR)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}
