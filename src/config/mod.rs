//! Configuration management for entity storage.
//!
//! This module provides configuration loading through TOML files and
//! environment variable overrides via `.env` files.
//!
//! # Example
//!
//! ```no_run
//! use entity_storage::config::{ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let env = EnvironmentLoader::new(None);
//!     let loader = ConfigurationLoader::new(Some(Path::new("config/storage.toml")))?
//!         .with_env(&env);
//!
//!     let storage = loader.config.storage.builder().build().await?;
//!     println!("Using {} storage", storage.backend_type());
//!     Ok(())
//! }
//! ```

/// TOML configuration structures and loader
#[allow(clippy::module_inception)]
pub mod config;
/// Environment variable overrides
pub mod environment;

// Re-export main types for convenience
pub use self::config::{
    open_storage, Configuration, ConfigurationLoader, LoggingConfig, StorageConfig,
};
pub use self::environment::EnvironmentLoader;
