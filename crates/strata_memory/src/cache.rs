// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory cache implementation using moka.

use std::collections::HashMap;
use std::fmt;

use strata_tier::{Cache, CacheSync, Expiry, Lifetime, Result, Ttl, validate_key};
use tick::Clock;

use crate::builder::MemoryCacheBuilder;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expiry: Expiry,
}

/// A process-local cache with per-entry expiry, backed by moka.
///
/// Entry lifetimes are tracked against the injected [`Clock`] rather than by moka,
/// so expiry follows `tick::ClockControl` in tests. Expired entries are removed
/// lazily when a read or presence check finds them, and in bulk by [`Cache::prune`].
/// Both the blocking [`CacheSync`] and the asynchronous [`Cache`] interfaces
/// operate on the same store.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use strata_memory::MemoryCache;
/// use strata_tier::{Cache, Ttl};
/// use tick::ClockControl;
///
/// # futures::executor::block_on(async {
/// let control = ClockControl::new();
/// let cache = MemoryCache::builder(control.to_clock()).build();
///
/// cache.set("token", "abc".to_string(), Ttl::After(Duration::from_secs(1))).await.unwrap();
/// assert_eq!(cache.get("token").await.unwrap().as_deref(), Some("abc"));
///
/// control.advance(Duration::from_secs(1));
/// assert_eq!(cache.get("token").await.unwrap(), None);
/// # });
/// ```
pub struct MemoryCache<V> {
    entries: moka::sync::Cache<String, Entry<V>>,
    lifetime: Lifetime,
    clock: Clock,
}

impl<V> fmt::Debug for MemoryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("lifetime", &self.lifetime)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<V> MemoryCache<V> {
    /// Starts configuring a cache that reads time from `clock`.
    #[must_use]
    pub fn builder(clock: Clock) -> MemoryCacheBuilder<V> {
        MemoryCacheBuilder::new(clock)
    }
}

impl<V> MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn from_builder(builder: MemoryCacheBuilder<V>) -> Self {
        Self {
            entries: moka::sync::Cache::builder()
                .initial_capacity(builder.initial_capacity)
                .build(),
            lifetime: Lifetime::new(builder.default_lifetime),
            clock: builder.clock,
        }
    }

    /// Returns the number of stored entries, including expired ones not yet removed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    /// Returns `true` if no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().next().is_none()
    }

    /// Returns the live entry under `key`, invalidating it if it has expired.
    fn live(&self, key: &str) -> Option<Entry<V>> {
        let entry = self.entries.get(key)?;
        if entry.expiry.is_expired(self.clock.system_time()) {
            self.entries.invalidate(key);
            return None;
        }
        Some(entry)
    }
}

impl<V> CacheSync<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get_sync(&self, key: &str) -> Result<Option<V>> {
        validate_key(key)?;
        Ok(self.live(key).map(|entry| entry.value))
    }

    fn set_sync(&self, key: &str, value: V, ttl: Ttl) -> Result<bool> {
        validate_key(key)?;
        match self.lifetime.resolve(ttl, self.clock.system_time()) {
            Some(expiry) => self.entries.insert(key.to_owned(), Entry { value, expiry }),
            None => self.entries.invalidate(key),
        }
        Ok(true)
    }

    fn delete_sync(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        self.entries.invalidate(key);
        Ok(true)
    }

    fn clear_sync(&self) -> Result<bool> {
        self.entries.invalidate_all();
        Ok(true)
    }

    fn has_sync(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.live(key).is_some())
    }

    fn prune_sync(&self) -> Result<bool> {
        let now = self.clock.system_time();
        for (key, entry) in &self.entries {
            if entry.expiry.is_expired(now) {
                self.entries.invalidate(key.as_str());
            }
        }
        Ok(true)
    }

    fn reset_sync(&self) -> Result<()> {
        self.clear_sync().map(drop)
    }
}

impl<V> Cache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
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
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tick::ClockControl;

    use super::*;

    #[test]
    fn expired_entry_is_removed_on_read() {
        let control = ClockControl::new();
        let cache = MemoryCache::builder(control.to_clock()).build();

        cache.set_sync("k", 1, Ttl::After(Duration::from_millis(10))).unwrap();
        control.advance_millis(10);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_sync("k").unwrap(), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entry_is_removed_on_presence_check() {
        let control = ClockControl::new();
        let cache = MemoryCache::builder(control.to_clock()).build();

        cache.set_sync("k", 1, Ttl::After(Duration::from_millis(10))).unwrap();
        assert!(cache.has_sync("k").unwrap());

        control.advance_millis(11);
        assert!(!cache.has_sync("k").unwrap());
        assert!(cache.is_empty());
    }

    #[test]
    fn prune_keeps_only_live_entries() {
        let control = ClockControl::new();
        let cache = MemoryCache::builder(control.to_clock()).build();

        cache.set_sync("short", 1, Ttl::After(Duration::from_secs(1))).unwrap();
        cache.set_sync("long", 2, Ttl::After(Duration::from_secs(10))).unwrap();
        cache.set_sync("forever", 3, Ttl::Never).unwrap();

        control.advance(Duration::from_secs(5));
        assert!(cache.prune_sync().unwrap());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_sync("long").unwrap(), Some(2));
        assert_eq!(cache.get_sync("forever").unwrap(), Some(3));
    }

    #[test]
    fn default_lifetime_applies_to_default_ttl() {
        let control = ClockControl::new();
        let cache = MemoryCache::builder(control.to_clock())
            .default_lifetime(Duration::from_secs(2))
            .build();

        cache.set_sync("k", 1, Ttl::Default).unwrap();
        control.advance(Duration::from_secs(1));
        assert_eq!(cache.get_sync("k").unwrap(), Some(1));

        control.advance(Duration::from_secs(1));
        assert_eq!(cache.get_sync("k").unwrap(), None);
    }
}
