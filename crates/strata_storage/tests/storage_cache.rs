// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `StorageCache`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::executor::block_on;
use strata_storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageCache};
use strata_tier::{Cache, CacheExt, Ttl, ValueRepresentation};
use tick::ClockControl;

fn cache_in(storage: Arc<dyn KeyValueStorage>, namespace: &str, control: &ClockControl) -> StorageCache<String> {
    StorageCache::builder(control.to_clock())
        .storage(storage)
        .namespace(namespace)
        .build()
        .unwrap()
}

#[test]
fn round_trip() {
    let control = ClockControl::new();
    let cache = cache_in(Arc::new(MemoryStorage::new()), "", &control);

    block_on(async {
        assert!(cache.set("k", "v".to_string(), Ttl::Default).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(cache.has("k").await.unwrap());
    });
}

#[test]
fn entry_expires_after_ttl() {
    let control = ClockControl::new();
    let cache = cache_in(Arc::new(MemoryStorage::new()), "", &control);

    block_on(async {
        cache.set("k", "v".to_string(), Ttl::After(Duration::from_millis(1))).await.unwrap();
        control.advance_millis(2);

        assert!(!cache.has("k").await.unwrap());
        assert_eq!(cache.get_or("k", "fallback".to_string()).await.unwrap(), "fallback");
    });
}

#[test]
fn zero_ttl_behaves_like_delete() {
    let control = ClockControl::new();
    let storage = Arc::new(MemoryStorage::new());
    let cache = cache_in(Arc::clone(&storage) as Arc<dyn KeyValueStorage>, "", &control);

    block_on(async {
        cache.set("k", "v".to_string(), Ttl::Never).await.unwrap();
        cache.set("k", "w".to_string(), Ttl::After(Duration::ZERO)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    });
    assert_eq!(storage.len().unwrap(), 0);
}

#[test]
fn clear_is_confined_to_the_namespace() {
    let control = ClockControl::new();
    let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
    let users = cache_in(Arc::clone(&storage), "users", &control);
    let orders = cache_in(Arc::clone(&storage), "orders", &control);

    block_on(async {
        users.set("1", "alice".to_string(), Ttl::Never).await.unwrap();
        orders.set("1", "book".to_string(), Ttl::Never).await.unwrap();

        assert!(users.clear().await.unwrap());

        assert_eq!(users.get("1").await.unwrap(), None);
        assert_eq!(orders.get("1").await.unwrap().as_deref(), Some("book"));
    });
}

#[test]
fn batch_operations() {
    let control = ClockControl::new();
    let cache = cache_in(Arc::new(MemoryStorage::new()), "batch", &control);
    let keys = vec!["x".to_string(), "y".to_string(), "z".to_string()];

    block_on(async {
        let entries = HashMap::from([("x".to_string(), "1".to_string()), ("y".to_string(), "2".to_string())]);
        assert!(cache.set_multiple(entries, Ttl::Never).await.unwrap());

        let found = cache.get_multiple(&keys).await.unwrap();
        assert_eq!(found["x"].as_deref(), Some("1"));
        assert_eq!(found["y"].as_deref(), Some("2"));
        assert_eq!(found["z"], None);

        assert!(cache.delete_multiple(&keys).await.unwrap());
        assert!(cache.get_multiple(&keys).await.unwrap().values().all(Option::is_none));
    });
}

#[test]
fn reports_serialized_representation() {
    let control = ClockControl::new();
    let cache = cache_in(Arc::new(MemoryStorage::new()), "", &control);
    assert_eq!(cache.value_representation(), ValueRepresentation::Serialized);
}

#[test]
fn file_storage_survives_a_new_cache_instance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.json");
    let control = ClockControl::new();

    {
        let cache = cache_in(Arc::new(FileStorage::open(&path).unwrap()), "persist", &control);
        block_on(cache.set("k", "kept".to_string(), Ttl::Never)).unwrap();
    }

    let reopened = cache_in(Arc::new(FileStorage::open(&path).unwrap()), "persist", &control);
    assert_eq!(block_on(reopened.get("k")).unwrap().as_deref(), Some("kept"));
}
