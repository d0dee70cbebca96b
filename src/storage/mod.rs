//! Entity Storage Abstraction
//!
//! This module provides a trait-based abstraction for entity storage backends.
//! The production implementation persists entities in MongoDB/DocumentDB; an
//! in-memory implementation with the same document layout is available for
//! tests and tooling.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │       Engine        │
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │    EntityStorage    │  <-- Trait
//! │      (async)        │
//! └──────────┬──────────┘
//!            │
//!     ┌──────┴──────┐
//!     │             │
//! ┌───▼───┐   ┌─────▼─────┐
//! │Memory │   │  MongoDB  │
//! │Backend│   │  Backend  │
//! └───────┘   └─────┬─────┘
//!                   │ normalize
//!             {_id, data} documents
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use entity_storage::storage::{EntityId, EntityStorage, StorageBackendBuilder};
//! use serde_json::json;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let storage = StorageBackendBuilder::new("mongodb")
//!         .with_url("mongodb://localhost:27017")
//!         .with_database("goworld")
//!         .build()
//!         .await?;
//!
//!     let id = EntityId::from("p1");
//!     storage.write("Player", &id, &json!({"hp": 100})).await?;
//!     assert!(storage.exists("Player", &id).await?);
//!
//!     Ok(())
//! }
//! ```

mod memory_backend;
#[cfg(feature = "storage-mongodb")]
mod mongodb_backend;
pub mod normalize;
mod traits;

pub use memory_backend::MemoryEntityStorage;
#[cfg(feature = "storage-mongodb")]
pub use mongodb_backend::MongoEntityStorage;
pub use normalize::{normalize, to_bson, DocumentValue, Shape};
pub use traits::*;

/// Builder for creating storage backends from configuration
pub struct StorageBackendBuilder {
    backend_type: String,
    url: Option<String>,
    database: String,
    options: StorageOptions,
}

impl StorageBackendBuilder {
    /// Create a new builder
    pub fn new(backend_type: &str) -> Self {
        Self {
            backend_type: backend_type.to_string(),
            url: None,
            database: String::new(),
            options: StorageOptions::default(),
        }
    }

    /// Set the connection string (for the MongoDB backend)
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    /// Set the database name; empty selects the default
    pub fn with_database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    /// Set connection and operation bounds
    pub fn with_options(mut self, options: StorageOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the storage backend, connecting if needed
    pub async fn build(self) -> StorageResult<Box<dyn EntityStorage>> {
        self.options.validate()?;

        match self.backend_type.as_str() {
            "memory" => Ok(Box::new(MemoryEntityStorage::new())),
            #[cfg(feature = "storage-mongodb")]
            "mongodb" | "documentdb" => {
                let url = self
                    .url
                    .ok_or_else(|| StorageError::Configuration("url is required".into()))?;
                let backend =
                    MongoEntityStorage::open_with_options(&url, &self.database, self.options)
                        .await?;
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "storage-mongodb"))]
            "mongodb" | "documentdb" => Err(StorageError::Configuration(format!(
                "{} backend requires the storage-mongodb feature",
                self.backend_type
            ))),
            unknown => Err(StorageError::Configuration(format!(
                "Unknown backend type: {}",
                unknown
            ))),
        }
    }
}
