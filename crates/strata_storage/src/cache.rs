// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache implementation over a [`KeyValueStorage`].

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use strata_tier::{Cache, CacheSync, Error, Expiry, Lifetime, Result, Ttl, ValueRepresentation, validate_key};
use tick::Clock;

use crate::builder::StorageCacheBuilder;
use crate::{KeyValueStorage, StorageErrorKind};

/// Prefix shared by the storage keys of every [`StorageCache`].
pub const NAMESPACE_PREFIX: &str = "StorageCache_";

/// Ends the namespace inside a storage key.
pub(crate) const NAMESPACE_SEPARATOR: char = ':';

/// A cache persisted in a [`KeyValueStorage`].
///
/// Values are stored as JSON `[value, expiry]` pairs, with the expiry in epoch
/// milliseconds or `null` for entries that never expire. All storage keys carry
/// the prefix `StorageCache_<namespace>:`; [`clear`](Cache::clear) and
/// [`prune`](Cache::prune) never touch keys outside of it.
///
/// Entries that cannot be parsed are treated as absent and removed.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use strata_storage::{MemoryStorage, StorageCache};
/// use strata_tier::{CacheSync, Ttl};
/// use tick::ClockControl;
///
/// let storage = Arc::new(MemoryStorage::new());
/// let cache = StorageCache::<u32>::builder(ClockControl::new().to_clock())
///     .storage(storage)
///     .namespace("users")
///     .build()
///     .unwrap();
///
/// cache.set_sync("42", 7, Ttl::Never).unwrap();
/// assert_eq!(cache.get_sync("42").unwrap(), Some(7));
/// ```
#[derive(Debug)]
pub struct StorageCache<V> {
    storage: Arc<dyn KeyValueStorage>,
    prefix: String,
    lifetime: Lifetime,
    clock: Clock,
    _value: PhantomData<fn() -> V>,
}

impl<V> StorageCache<V> {
    /// Starts configuring a cache that reads time from `clock`.
    #[must_use]
    pub fn builder(clock: Clock) -> StorageCacheBuilder<V> {
        StorageCacheBuilder::new(clock)
    }

    pub(crate) fn new(storage: Arc<dyn KeyValueStorage>, namespace: &str, lifetime: Lifetime, clock: Clock) -> Self {
        Self {
            storage,
            prefix: format!("{NAMESPACE_PREFIX}{namespace}{NAMESPACE_SEPARATOR}"),
            lifetime,
            clock,
            _value: PhantomData,
        }
    }

    /// Returns the prefix of every storage key owned by this cache.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    fn owned_storage_keys(&self) -> Result<Vec<String>> {
        let keys = self.storage.keys().map_err(Error::storage)?;
        Ok(keys.into_iter().filter(|k| k.starts_with(&self.prefix)).collect())
    }

    /// Reads and parses the raw entry stored under `storage_key`, dropping it if unparsable.
    fn read<T: DeserializeOwned>(&self, storage_key: &str) -> Result<Option<(T, Expiry)>> {
        let Some(raw) = self.storage.get_item(storage_key).map_err(Error::storage)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(storage.key = storage_key, error = %e, "dropping unparsable cache entry");
                self.storage.remove_item(storage_key).map_err(Error::storage)?;
                Ok(None)
            }
        }
    }

    /// Reads a live entry, removing it first if it has expired.
    fn read_live<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let storage_key = self.storage_key(key);
        match self.read::<T>(&storage_key)? {
            Some((value, expiry)) if !expiry.is_expired(self.clock.system_time()) => Ok(Some(value)),
            Some(_) => {
                self.storage.remove_item(&storage_key).map_err(Error::storage)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

impl<V> CacheSync<V> for StorageCache<V>
where
    V: Serialize + DeserializeOwned,
{
    fn get_sync(&self, key: &str) -> Result<Option<V>> {
        validate_key(key)?;
        self.read_live(key)
    }

    fn set_sync(&self, key: &str, value: V, ttl: Ttl) -> Result<bool> {
        validate_key(key)?;
        let Some(expiry) = self.lifetime.resolve(ttl, self.clock.system_time()) else {
            return self.delete_sync(key);
        };

        let raw = serde_json::to_string(&(&value, expiry)).map_err(Error::serialization)?;
        match self.storage.set_item(&self.storage_key(key), &raw) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == StorageErrorKind::QuotaExceeded => {
                tracing::warn!(cache.key = key, error = %e, "storage declined cache write");
                Ok(false)
            }
            Err(e) => Err(Error::storage(e)),
        }
    }

    fn delete_sync(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        self.storage.remove_item(&self.storage_key(key)).map_err(Error::storage)?;
        Ok(true)
    }

    fn clear_sync(&self) -> Result<bool> {
        for storage_key in self.owned_storage_keys()? {
            self.storage.remove_item(&storage_key).map_err(Error::storage)?;
        }
        Ok(true)
    }

    fn has_sync(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.read_live::<IgnoredAny>(key)?.is_some())
    }

    fn prune_sync(&self) -> Result<bool> {
        let now = self.clock.system_time();
        for storage_key in self.owned_storage_keys()? {
            if let Some((IgnoredAny, expiry)) = self.read::<IgnoredAny>(&storage_key)?
                && expiry.is_expired(now)
            {
                self.storage.remove_item(&storage_key).map_err(Error::storage)?;
            }
        }
        Ok(true)
    }

    fn reset_sync(&self) -> Result<()> {
        self.clear_sync().map(drop)
    }
}

impl<V> Cache<V> for StorageCache<V>
where
    V: Serialize + DeserializeOwned + Send,
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

    async fn prune(&self) -> Result<bool> {
        self.prune_sync()
    }

    async fn reset(&self) -> Result<()> {
        self.reset_sync()
    }

    fn value_representation(&self) -> ValueRepresentation {
        ValueRepresentation::Serialized
    }
}
