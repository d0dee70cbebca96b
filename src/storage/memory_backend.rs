//! In-Memory Entity Storage Backend
//!
//! Keeps entity documents in process memory using the same
//! `{_id, data}` layout and the same encode/normalize path as the MongoDB
//! backend. Useful for engine tests and tools that run without a server.

use async_trait::async_trait;
use mongodb::bson::Document;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::normalize::{entity_document, normalize, DATA_FIELD};
use super::traits::{EntityId, EntityStorage, GenericValue, StorageError, StorageResult};

/// type name -> entity id -> stored document
type Collections = HashMap<String, HashMap<EntityId, Document>>;

/// In-memory entity storage backend
#[derive(Default)]
pub struct MemoryEntityStorage {
    collections: RwLock<Collections>,
    closed: AtomicBool,
}

impl MemoryEntityStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities stored under a type
    pub async fn len(&self, type_name: &str) -> usize {
        self.collections
            .read()
            .await
            .get(type_name)
            .map_or(0, HashMap::len)
    }

    /// Whether no entity is stored under a type
    pub async fn is_empty(&self, type_name: &str) -> bool {
        self.len(type_name).await == 0
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStorage for MemoryEntityStorage {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn is_available(&self) -> bool {
        self.ensure_open().is_ok()
    }

    async fn write(
        &self,
        type_name: &str,
        id: &EntityId,
        value: &GenericValue,
    ) -> StorageResult<()> {
        self.ensure_open()?;
        debug!(type_name, %id, "Writing entity");

        let doc = entity_document(id, value)?;
        self.collections
            .write()
            .await
            .entry(type_name.to_string())
            .or_default()
            .insert(id.clone(), doc);
        Ok(())
    }

    async fn read(&self, type_name: &str, id: &EntityId) -> StorageResult<GenericValue> {
        self.ensure_open()?;
        debug!(type_name, %id, "Reading entity");

        let collections = self.collections.read().await;
        let doc = collections
            .get(type_name)
            .and_then(|entities| entities.get(id))
            .ok_or_else(|| StorageError::not_found(type_name, id))?;

        let data = doc.get(DATA_FIELD).ok_or_else(|| {
            StorageError::Decode(format!(
                "document {}/{} has no {} field",
                type_name, id, DATA_FIELD
            ))
        })?;
        normalize(data)
    }

    async fn list(&self, type_name: &str) -> StorageResult<Vec<EntityId>> {
        self.ensure_open()?;
        debug!(type_name, "Listing entities");

        Ok(self
            .collections
            .read()
            .await
            .get(type_name)
            .map(|entities| entities.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn exists(&self, type_name: &str, id: &EntityId) -> StorageResult<bool> {
        self.ensure_open()?;
        debug!(type_name, %id, "Checking entity existence");

        Ok(self
            .collections
            .read()
            .await
            .get(type_name)
            .is_some_and(|entities| entities.contains_key(id)))
    }

    async fn delete(&self, type_name: &str, id: &EntityId) -> StorageResult<()> {
        self.ensure_open()?;
        debug!(type_name, %id, "Deleting entity");

        if let Some(entities) = self.collections.write().await.get_mut(type_name) {
            entities.remove(id);
        }
        Ok(())
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            warn!("Memory storage already closed");
            return;
        }
        self.collections.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_backend_basic() {
        let storage = MemoryEntityStorage::new();
        assert!(storage.is_available().await);
        assert_eq!(storage.backend_type(), "memory");
        assert!(storage.is_empty("Player").await);
    }

    #[tokio::test]
    async fn test_memory_crud() {
        let storage = MemoryEntityStorage::new();
        let id = EntityId::from("p1");
        let value = json!({"hp": 100, "inventory": ["sword", "shield"]});

        // Write
        storage.write("Player", &id, &value).await.unwrap();
        assert_eq!(storage.len("Player").await, 1);

        // Read
        assert_eq!(storage.read("Player", &id).await.unwrap(), value);

        // Exists
        assert!(storage.exists("Player", &id).await.unwrap());
        assert!(!storage.exists("Monster", &id).await.unwrap());

        // Delete
        storage.delete("Player", &id).await.unwrap();
        assert!(!storage.exists("Player", &id).await.unwrap());
        storage.delete("Player", &id).await.unwrap();
    }

    #[tokio::test]
    async fn test_types_are_separate_namespaces() {
        let storage = MemoryEntityStorage::new();
        let id = EntityId::from("shared");
        storage.write("Player", &id, &json!(1)).await.unwrap();
        storage.write("Monster", &id, &json!(2)).await.unwrap();

        assert_eq!(storage.read("Player", &id).await.unwrap(), json!(1));
        assert_eq!(storage.read("Monster", &id).await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn test_encode_failure_leaves_store_untouched() {
        let storage = MemoryEntityStorage::new();
        let id = EntityId::from("p1");
        let result = storage.write("Player", &id, &json!({"n": u64::MAX})).await;

        assert!(matches!(result, Err(StorageError::Encode(_))));
        assert!(!storage.exists("Player", &id).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_does_not_decode_state() {
        let storage = MemoryEntityStorage::new();
        let id = EntityId::from("p1");
        // Written by another tool: no data field
        storage
            .collections
            .write()
            .await
            .entry("Player".to_string())
            .or_default()
            .insert(id.clone(), doc! { "_id": "p1" });

        assert!(storage.exists("Player", &id).await.unwrap());
        assert!(matches!(
            storage.read("Player", &id).await,
            Err(StorageError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_operations_fail_after_close() {
        let storage = MemoryEntityStorage::new();
        let id = EntityId::from("p1");
        storage.write("Player", &id, &json!({})).await.unwrap();

        storage.close().await;
        storage.close().await;

        assert!(!storage.is_available().await);
        assert!(matches!(
            storage.read("Player", &id).await,
            Err(StorageError::Closed)
        ));
        assert!(matches!(
            storage.exists("Player", &id).await,
            Err(StorageError::Closed)
        ));
        assert!(matches!(
            storage.write("Player", &id, &json!({})).await,
            Err(StorageError::Closed)
        ));
        assert!(matches!(storage.list("Player").await, Err(StorageError::Closed)));
    }
}
