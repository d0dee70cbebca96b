//! Behaviour every `EntityStorage` backend must show.
//!
//! Each check uses its own type name so checks can share one backend.

#![allow(dead_code)]

use entity_storage::storage::{EntityId, EntityStorage, StorageError};
use serde_json::{json, Value};
use std::collections::HashSet;

fn id(raw: &str) -> EntityId {
    EntityId::from(raw)
}

pub async fn player_scenario(storage: &dyn EntityStorage, type_name: &str) {
    let state = json!({"hp": 100, "inventory": ["sword", "shield"]});
    storage.write(type_name, &id("p1"), &state).await.unwrap();

    assert_eq!(storage.read(type_name, &id("p1")).await.unwrap(), state);
    assert!(storage.exists(type_name, &id("p1")).await.unwrap());
    assert!(storage
        .list(type_name)
        .await
        .unwrap()
        .contains(&id("p1")));

    match storage.read(type_name, &id("p2")).await {
        Err(StorageError::NotFound { type_name: t, id: missing }) => {
            assert_eq!(t, type_name);
            assert_eq!(missing, id("p2"));
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

pub async fn deep_round_trip(storage: &dyn EntityStorage, type_name: &str) {
    let state = json!({
        "a": {"b": [{"c": 1}, {"d": [2, 3]}]},
        "quests": {
            "main": {"chapter1": {"steps": [{"done": true, "loot": {"gold": 50}}]}}
        },
        "position": {"x": 1.5, "y": -2.25, "z": 0.0},
        "buffs": [],
        "guild": null,
        "created": 1_700_000_000_123i64
    });
    storage.write(type_name, &id("deep"), &state).await.unwrap();

    let read = storage.read(type_name, &id("deep")).await.unwrap();
    assert_eq!(read, state);

    let chapter = &read["quests"]["main"]["chapter1"];
    assert!(chapter.is_object());
    assert!(chapter["steps"][0]["loot"].is_object());
    assert!(read["a"]["b"][1]["d"].is_array());
}

pub async fn idempotent_and_overwrite(storage: &dyn EntityStorage, type_name: &str) {
    let v1 = json!({"hp": 10, "mp": 5, "bag": {"potion": 2}});
    let v2 = json!({"hp": 20, "bag": {"elixir": 1}});

    storage.write(type_name, &id("e1"), &v1).await.unwrap();
    storage.write(type_name, &id("e1"), &v1).await.unwrap();
    assert_eq!(storage.read(type_name, &id("e1")).await.unwrap(), v1);
    assert_eq!(storage.list(type_name).await.unwrap(), vec![id("e1")]);

    // Replace, never merge
    storage.write(type_name, &id("e1"), &v2).await.unwrap();
    let read = storage.read(type_name, &id("e1")).await.unwrap();
    assert_eq!(read, v2);
    assert!(read.get("mp").is_none());
    assert!(read["bag"].get("potion").is_none());
}

pub async fn existence_semantics(storage: &dyn EntityStorage, type_name: &str) {
    assert!(!storage.exists(type_name, &id("x")).await.unwrap());
    storage.write(type_name, &id("x"), &json!({})).await.unwrap();
    assert!(storage.exists(type_name, &id("x")).await.unwrap());

    storage.delete(type_name, &id("x")).await.unwrap();
    assert!(!storage.exists(type_name, &id("x")).await.unwrap());
    storage.delete(type_name, &id("x")).await.unwrap();
}

pub async fn list_completeness(storage: &dyn EntityStorage, type_name: &str) {
    assert!(storage.list(type_name).await.unwrap().is_empty());

    let expected: HashSet<EntityId> = (0..25).map(|i| id(&format!("npc-{}", i))).collect();
    for entity in &expected {
        storage
            .write(type_name, entity, &json!({"name": entity.as_str()}))
            .await
            .unwrap();
    }

    let listed = storage.list(type_name).await.unwrap();
    assert_eq!(listed.len(), expected.len());
    assert_eq!(listed.into_iter().collect::<HashSet<_>>(), expected);
}

pub async fn scalar_values(storage: &dyn EntityStorage, type_name: &str) {
    for (raw, value) in [
        ("int", json!(7)),
        ("string", json!("plain")),
        ("list", json!([1, "two", [3.5]])),
        ("null", Value::Null),
    ] {
        storage.write(type_name, &id(raw), &value).await.unwrap();
        assert_eq!(storage.read(type_name, &id(raw)).await.unwrap(), value);
    }
}

pub async fn fails_after_close(storage: &dyn EntityStorage, type_name: &str) {
    storage.close().await;
    assert!(!storage.is_available().await);
    assert!(matches!(
        storage.read(type_name, &id("p1")).await,
        Err(StorageError::Closed)
    ));
    assert!(matches!(
        storage.exists(type_name, &id("p1")).await,
        Err(StorageError::Closed)
    ));
    assert!(!storage.is_end_of_data(&StorageError::Closed));
}
