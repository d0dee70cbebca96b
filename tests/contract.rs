//! Storage contract checks against the in-memory backend.

mod common;

use entity_storage::storage::{
    EntityId, EntityStorage, MemoryEntityStorage, StorageBackendBuilder, StorageError,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_player_scenario() {
    let storage = MemoryEntityStorage::new();
    common::player_scenario(&storage, "Player").await;
}

#[tokio::test]
async fn test_deep_round_trip() {
    let storage = MemoryEntityStorage::new();
    common::deep_round_trip(&storage, "Player").await;
}

#[tokio::test]
async fn test_idempotent_and_overwrite() {
    let storage = MemoryEntityStorage::new();
    common::idempotent_and_overwrite(&storage, "Player").await;
}

#[tokio::test]
async fn test_existence_semantics() {
    let storage = MemoryEntityStorage::new();
    common::existence_semantics(&storage, "Player").await;
}

#[tokio::test]
async fn test_list_completeness() {
    let storage = MemoryEntityStorage::new();
    common::list_completeness(&storage, "Monster").await;
}

#[tokio::test]
async fn test_scalar_values() {
    let storage = MemoryEntityStorage::new();
    common::scalar_values(&storage, "Misc").await;
}

#[tokio::test]
async fn test_fails_after_close() {
    let storage = StorageBackendBuilder::new("memory").build().await.unwrap();
    common::fails_after_close(storage.as_ref(), "Player").await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers() {
    let storage: Arc<dyn EntityStorage> = Arc::new(MemoryEntityStorage::new());

    let mut handles = Vec::new();
    for worker in 0..8 {
        let storage = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            for n in 0..20 {
                let id = EntityId::from(format!("w{}-{}", worker, n));
                storage
                    .write("Avatar", &id, &json!({"worker": worker, "n": n}))
                    .await?;
            }
            Ok::<_, StorageError>(())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(storage.list("Avatar").await.unwrap().len(), 160);
    let state = storage
        .read("Avatar", &EntityId::from("w3-7"))
        .await
        .unwrap();
    assert_eq!(state, json!({"worker": 3, "n": 7}));
}

#[tokio::test]
async fn test_not_found_is_not_end_of_data() {
    let storage = MemoryEntityStorage::new();
    let err = storage
        .read("Player", &EntityId::from("ghost"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(!storage.is_end_of_data(&err));
    assert!(storage.is_end_of_data(&StorageError::EndOfData));
}
