// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::{Database, DatabaseError, ObjectStore};

type Records = Arc<Mutex<BTreeMap<String, Value>>>;

/// An in-process [`Database`].
///
/// Clones share the same databases, so a store opened twice under the same
/// names sees the same records.
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    stores: Arc<Mutex<HashMap<(String, String), Records>>>,
    available: bool,
}

impl MemoryDatabase {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stores: Arc::default(),
            available: true,
        }
    }

    /// Creates a database that refuses to open, as on a host without database support.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            stores: Arc::default(),
            available: false,
        }
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl Database for MemoryDatabase {
    type Store = MemoryObjectStore;

    async fn open(&self, database: &str, store: &str) -> Result<MemoryObjectStore, DatabaseError> {
        if !self.available {
            return Err(DatabaseError::open(format!("cannot open database {database}")));
        }

        let records = Arc::clone(
            self.stores
                .lock()
                .entry((database.to_owned(), store.to_owned()))
                .or_default(),
        );
        Ok(MemoryObjectStore { records })
    }
}

/// An object store of a [`MemoryDatabase`].
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    records: Records,
}

impl MemoryObjectStore {
    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DatabaseError> {
        Ok(self.records.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, record: Value) -> Result<(), DatabaseError> {
        self.records.lock().insert(key.to_owned(), record);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.records.lock().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), DatabaseError> {
        self.records.lock().clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, DatabaseError> {
        Ok(self.records.lock().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatabaseErrorKind;

    #[tokio::test]
    async fn stores_are_shared_by_name() {
        let database = MemoryDatabase::new();
        let first = database.open("db", "store").await.unwrap();
        let second = database.clone().open("db", "store").await.unwrap();
        let other = database.open("db", "other").await.unwrap();

        first.put("k", Value::from(1)).await.unwrap();

        assert_eq!(second.get("k").await.unwrap(), Some(Value::from(1)));
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn unavailable_database_refuses_to_open() {
        let error = MemoryDatabase::unavailable().open("db", "store").await.unwrap_err();
        assert_eq!(error.kind(), DatabaseErrorKind::Open);
    }
}
