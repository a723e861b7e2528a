// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::{KeyValueStorage, StorageError};

/// Session-scoped storage that lives as long as the process.
///
/// An optional quota, counted in bytes of keys plus values, makes writes fail
/// with [`StorageErrorKind::QuotaExceeded`](crate::StorageErrorKind::QuotaExceeded)
/// once the storage is full.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Creates an empty, unbounded storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty storage holding at most `bytes` bytes of keys and values.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: Mutex::default(),
            quota: Some(bytes),
        }
    }
}

fn usage(items: &BTreeMap<String, String>) -> usize {
    items.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock();

        if let Some(quota) = self.quota {
            let replaced = items.get(key).map_or(0, |old| key.len() + old.len());
            let needed = usage(&items) - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::quota_exceeded(format!("{needed} bytes needed, quota is {quota}")));
            }
        }

        items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items.lock().keys().cloned().collect())
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.items.lock().len())
    }
}
