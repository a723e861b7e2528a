// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Type-erased caches.

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use crate::{Cache, Result, Ttl, ValueRepresentation, cache::DynCache};

/// Converts any [`Cache`] into a [`DynamicCache`].
///
/// # Examples
///
/// ```
/// use strata_tier::{DynamicCache, DynamicCacheExt, NullCache};
///
/// let caches: Vec<DynamicCache<String>> = vec![NullCache::<String>::new().into_dynamic()];
/// assert_eq!(caches.len(), 1);
/// ```
pub trait DynamicCacheExt<V>: Sized {
    /// Wraps this cache in a [`DynamicCache`].
    fn into_dynamic(self) -> DynamicCache<V>;
}

impl<V, C> DynamicCacheExt<V> for C
where
    C: Cache<V> + 'static,
{
    fn into_dynamic(self) -> DynamicCache<V> {
        DynamicCache::new(self)
    }
}

/// A clonable, type-erased cache.
///
/// Compositions hold their members as `DynamicCache` so that backends of
/// different concrete types can sit side by side.
pub struct DynamicCache<V>(Arc<DynCache<'static, V>>);

impl<V> DynamicCache<V> {
    /// Erases the concrete type of `cache`.
    pub fn new<C>(cache: C) -> Self
    where
        C: Cache<V> + 'static,
    {
        Self(DynCache::new_arc(cache))
    }
}

impl<V> Debug for DynamicCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicCache").finish_non_exhaustive()
    }
}

impl<V> Clone for DynamicCache<V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<V> Cache<V> for DynamicCache<V>
where
    V: Send,
{
    async fn get(&self, key: &str) -> Result<Option<V>> {
        self.0.get(key).await
    }

    async fn set(&self, key: &str, value: V, ttl: Ttl) -> Result<bool> {
        self.0.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.0.delete(key).await
    }

    async fn clear(&self) -> Result<bool> {
        self.0.clear().await
    }

    async fn get_multiple(&self, keys: &[String]) -> Result<HashMap<String, Option<V>>> {
        self.0.get_multiple(keys).await
    }

    async fn set_multiple(&self, entries: HashMap<String, V>, ttl: Ttl) -> Result<bool> {
        self.0.set_multiple(entries, ttl).await
    }

    async fn delete_multiple(&self, keys: &[String]) -> Result<bool> {
        self.0.delete_multiple(keys).await
    }

    async fn has(&self, key: &str) -> Result<bool> {
        self.0.has(key).await
    }

    async fn prune(&self) -> Result<bool> {
        self.0.prune().await
    }

    async fn reset(&self) -> Result<()> {
        self.0.reset().await
    }

    fn value_representation(&self) -> ValueRepresentation {
        self.0.value_representation()
    }
}
