// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{collections::HashMap, marker::PhantomData};

use crate::{Cache, CacheSync, Result, Ttl, validate_key, validate_keys};

/// A cache that stores nothing.
///
/// Reads always miss, writes report `false`, and deletions succeed. Use it where
/// an API requires a cache but caching is unwanted.
pub struct NullCache<V> {
    _value: PhantomData<fn() -> V>,
}

impl<V> NullCache<V> {
    /// Creates a new null cache.
    #[must_use]
    pub fn new() -> Self {
        Self { _value: PhantomData }
    }
}

impl<V> Default for NullCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for NullCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NullCache").finish()
    }
}

impl<V> CacheSync<V> for NullCache<V> {
    fn get_sync(&self, key: &str) -> Result<Option<V>> {
        validate_key(key)?;
        Ok(None)
    }

    fn set_sync(&self, key: &str, _value: V, _ttl: Ttl) -> Result<bool> {
        validate_key(key)?;
        Ok(false)
    }

    fn delete_sync(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(true)
    }

    fn clear_sync(&self) -> Result<bool> {
        Ok(true)
    }

    fn set_multiple_sync(&self, entries: HashMap<String, V>, _ttl: Ttl) -> Result<bool> {
        validate_keys(entries.keys())?;
        Ok(false)
    }

    fn has_sync(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(false)
    }
}

impl<V> Cache<V> for NullCache<V>
where
    V: Send,
{
    async fn get(&self, key: &str) -> Result<Option<V>> {
        self.get_sync(key)
    }

    async fn set(&self, key: &str, value: V, ttl: Ttl) -> Result<bool> {
        self.set_sync(key, value, ttl)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.delete_sync(key)
    }

    async fn clear(&self) -> Result<bool> {
        self.clear_sync()
    }

    async fn get_multiple(&self, keys: &[String]) -> Result<HashMap<String, Option<V>>> {
        self.get_multiple_sync(keys)
    }

    async fn set_multiple(&self, entries: HashMap<String, V>, ttl: Ttl) -> Result<bool> {
        self.set_multiple_sync(entries, ttl)
    }

    async fn delete_multiple(&self, keys: &[String]) -> Result<bool> {
        self.delete_multiple_sync(keys)
    }

    async fn has(&self, key: &str) -> Result<bool> {
        self.has_sync(key)
    }
}
