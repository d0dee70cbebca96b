//! Entity Storage - persistence backend for game-server entities
//!
//! Stores entity state (recursively nested key/value documents) in
//! MongoDB/DocumentDB, one collection per entity type, keyed by entity id.
//!
//! - **`storage`** - The [`storage::EntityStorage`] contract, the MongoDB
//!   backend (feature `storage-mongodb`), an in-memory backend and value
//!   normalization
//! - **`config`** - TOML and environment configuration (feature `config`)
//! - **`observability`** - `tracing` subscriber setup (feature `observability`)
//!
//! # Example
//!
//! ```ignore
//! use entity_storage::prelude::*;
//! use serde_json::json;
//!
//! async fn example() -> StorageResult<()> {
//!     let storage = MongoEntityStorage::open("mongodb://localhost:27017", "").await?;
//!
//!     let id = EntityId::from("p1");
//!     storage
//!         .write("Player", &id, &json!({"hp": 100, "inventory": ["sword", "shield"]}))
//!         .await?;
//!
//!     let state = storage.read("Player", &id).await?;
//!     assert_eq!(state["inventory"][0], "sword");
//!
//!     match storage.read("Player", &EntityId::from("p2")).await {
//!         Err(e) if e.is_not_found() => println!("p2 was never saved"),
//!         other => println!("unexpected: {:?}", other),
//!     }
//!
//!     storage.close().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Entity storage contract and backends
pub mod storage;

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

/// Observability utilities (enabled with the `observability` feature)
#[cfg(feature = "observability")]
pub mod observability;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::storage::{
        EntityId, EntityStorage, GenericValue, MemoryEntityStorage, StorageBackendBuilder,
        StorageError, StorageOptions, StorageResult,
    };

    #[cfg(feature = "storage-mongodb")]
    pub use crate::storage::MongoEntityStorage;

    #[cfg(feature = "config")]
    pub use crate::config::{
        open_storage, Configuration, ConfigurationLoader, EnvironmentLoader, StorageConfig,
    };

    #[cfg(feature = "observability")]
    pub use crate::observability::init_logging;
}
