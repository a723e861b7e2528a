// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache implementation over an [`ObjectStore`].

use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use strata_tier::{
    Cache, Error, Expiry, Lifetime, Result, Ttl, ValueRepresentation, read_or_miss, validate_key, validate_keys,
};
use tick::Clock;

use crate::{Database, ObjectStore};

/// Prefix of the database name used by every [`DurableCache`].
pub const DATABASE_PREFIX: &str = "STRATA_DB_";

/// Name of the object store holding cache entries.
pub const STORE_NAME: &str = "strata";

const DEFAULT_DATABASE_NAME: &str = "default";

/// A cache persisted in an asynchronous [`ObjectStore`].
///
/// Entries are `[value, expiry]` records. A missing record is a miss; an expired
/// record is deleted by the read, presence check or prune that finds it.
///
/// # Examples
///
/// ```
/// use strata_durable::{DurableCache, MemoryDatabase};
/// use strata_tier::{Cache, Ttl};
/// use tick::ClockControl;
///
/// # futures::executor::block_on(async {
/// let cache = DurableCache::<u32, _>::builder(ClockControl::new().to_clock())
///     .database_name("sessions")
///     .open(&MemoryDatabase::new())
///     .await
///     .unwrap();
///
/// cache.set("visits", 3, Ttl::Never).await.unwrap();
/// assert_eq!(cache.get("visits").await.unwrap(), Some(3));
/// # });
/// ```
#[derive(Debug)]
pub struct DurableCache<V, S> {
    store: S,
    lifetime: Lifetime,
    clock: Clock,
    _value: PhantomData<fn() -> V>,
}

impl<V, S> DurableCache<V, S> {
    /// Starts configuring a cache that reads time from `clock`.
    #[must_use]
    pub fn builder(clock: Clock) -> DurableCacheBuilder<V, S> {
        DurableCacheBuilder {
            clock,
            database_name: DEFAULT_DATABASE_NAME.to_owned(),
            default_lifetime: None,
            _types: PhantomData,
        }
    }

    /// Returns the underlying object store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<V, S> DurableCache<V, S>
where
    S: ObjectStore,
{
    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<(T, Expiry)>> {
        let Some(record) = self.store.get(key).await.map_err(Error::storage)? else {
            return Ok(None);
        };

        match serde_json::from_value(record) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(cache.key = key, error = %e, "dropping unreadable cache record");
                self.store.delete(key).await.map_err(Error::storage)?;
                Ok(None)
            }
        }
    }

    async fn read_live<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read::<T>(key).await? {
            Some((value, expiry)) if !expiry.is_expired(self.clock.system_time()) => Ok(Some(value)),
            Some(_) => {
                self.store.delete(key).await.map_err(Error::storage)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn write(&self, key: &str, record: serde_json::Value) -> Result<bool> {
        self.store.put(key, record).await.map_err(Error::storage)?;
        Ok(true)
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        self.store.delete(key).await.map_err(Error::storage)?;
        Ok(true)
    }
}

fn all_succeeded(results: Vec<Result<bool>>) -> Result<bool> {
    results
        .into_iter()
        .try_fold(true, |succeeded, result| Ok(succeeded & result?))
}

impl<V, S> Cache<V> for DurableCache<V, S>
where
    V: Serialize + DeserializeOwned + Send + Sync,
    S: ObjectStore,
{
    async fn get(&self, key: &str) -> Result<Option<V>> {
        validate_key(key)?;
        self.read_live(key).await
    }

    async fn set(&self, key: &str, value: V, ttl: Ttl) -> Result<bool> {
        validate_key(key)?;
        match self.lifetime.resolve(ttl, self.clock.system_time()) {
            Some(expiry) => {
                let record = serde_json::to_value((&value, expiry)).map_err(Error::serialization)?;
                self.write(key, record).await
            }
            None => self.remove(key).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        self.remove(key).await
    }

    async fn clear(&self) -> Result<bool> {
        self.store.clear().await.map_err(Error::storage)?;
        Ok(true)
    }

    async fn get_multiple(&self, keys: &[String]) -> Result<HashMap<String, Option<V>>> {
        validate_keys(keys)?;
        let values = join_all(keys.iter().map(|key| self.read_live::<V>(key))).await;
        Ok(keys
            .iter()
            .zip(values)
            .map(|(key, value)| (key.clone(), read_or_miss(key, value)))
            .collect())
    }

    async fn set_multiple(&self, entries: HashMap<String, V>, ttl: Ttl) -> Result<bool> {
        validate_keys(entries.keys())?;
        let Some(expiry) = self.lifetime.resolve(ttl, self.clock.system_time()) else {
            let keys: Vec<String> = entries.into_keys().collect();
            return self.delete_multiple(&keys).await;
        };

        let mut records = Vec::with_capacity(entries.len());
        for (key, value) in &entries {
            let record = serde_json::to_value((value, expiry)).map_err(Error::serialization)?;
            records.push((key.as_str(), record));
        }

        all_succeeded(join_all(records.into_iter().map(|(key, record)| self.write(key, record))).await)
    }

    async fn delete_multiple(&self, keys: &[String]) -> Result<bool> {
        validate_keys(keys)?;
        all_succeeded(join_all(keys.iter().map(|key| self.remove(key))).await)
    }

    async fn has(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.read_live::<IgnoredAny>(key).await?.is_some())
    }

    async fn prune(&self) -> Result<bool> {
        let now = self.clock.system_time();
        for key in self.store.keys().await.map_err(Error::storage)? {
            if let Some((IgnoredAny, expiry)) = self.read::<IgnoredAny>(&key).await?
                && expiry.is_expired(now)
            {
                self.remove(&key).await?;
            }
        }
        Ok(true)
    }

    async fn reset(&self) -> Result<()> {
        self.clear().await.map(drop)
    }

    fn value_representation(&self) -> ValueRepresentation {
        ValueRepresentation::Native
    }
}

/// Builder for a [`DurableCache`].
#[derive(Debug)]
pub struct DurableCacheBuilder<V, S> {
    clock: Clock,
    database_name: String,
    default_lifetime: Option<Duration>,
    _types: PhantomData<fn() -> (V, S)>,
}

impl<V, S> DurableCacheBuilder<V, S> {
    /// Sets the database name, which is stored prefixed with [`DATABASE_PREFIX`].
    ///
    /// Defaults to `default`.
    #[must_use]
    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    /// Sets the lifetime of entries written with [`Ttl::Default`].
    #[must_use]
    pub fn default_lifetime(mut self, lifetime: Duration) -> Self {
        self.default_lifetime = Some(lifetime);
        self
    }

    /// Opens the object store in `database` and builds the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::BackendUnavailable`](strata_tier::ErrorKind::BackendUnavailable)
    /// if the database cannot be opened.
    pub async fn open<D>(self, database: &D) -> Result<DurableCache<V, S>>
    where
        D: Database<Store = S>,
    {
        let name = format!("{DATABASE_PREFIX}{}", self.database_name);
        let store = database
            .open(&name, STORE_NAME)
            .await
            .map_err(Error::backend_unavailable)?;

        Ok(DurableCache {
            store,
            lifetime: Lifetime::new(self.default_lifetime),
            clock: self.clock,
            _value: PhantomData,
        })
    }
}
