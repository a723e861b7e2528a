// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for storage-backed caches.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use strata_tier::{Error, Lifetime, Result};
use tick::Clock;

use crate::cache::NAMESPACE_SEPARATOR;
use crate::{KeyValueStorage, StorageCache, StorageErrorKind};

const PROBE_KEY: &str = "__storage_test__";

/// Builder for a [`StorageCache`].
#[derive(Debug)]
pub struct StorageCacheBuilder<V> {
    clock: Clock,
    storage: Option<Arc<dyn KeyValueStorage>>,
    namespace: String,
    default_lifetime: Option<Duration>,
    _value: PhantomData<fn() -> V>,
}

impl<V> StorageCacheBuilder<V> {
    pub(crate) fn new(clock: Clock) -> Self {
        Self {
            clock,
            storage: None,
            namespace: String::new(),
            default_lifetime: None,
            _value: PhantomData,
        }
    }

    /// Sets the storage the cache persists into.
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the namespace that separates this cache from others sharing the storage.
    ///
    /// Defaults to the empty namespace. The namespace must not contain `:`, which
    /// separates it from the cache keys.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the lifetime of entries written with [`Ttl::Default`](strata_tier::Ttl::Default).
    #[must_use]
    pub fn default_lifetime(mut self, lifetime: Duration) -> Self {
        self.default_lifetime = Some(lifetime);
        self
    }

    /// Checks that the storage accepts writes and builds the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](strata_tier::ErrorKind::InvalidArgument)
    /// if the namespace contains `:`.
    ///
    /// Returns [`ErrorKind::BackendUnavailable`](strata_tier::ErrorKind::BackendUnavailable)
    /// if no storage was configured, or if a probe write fails. A full storage that
    /// already holds items is accepted, since it is evidently working.
    pub fn build(self) -> Result<StorageCache<V>> {
        if self.namespace.contains(NAMESPACE_SEPARATOR) {
            return Err(Error::invalid_argument(format!(
                "storage namespace {:?} must not contain {NAMESPACE_SEPARATOR:?}",
                self.namespace
            )));
        }

        let storage = self
            .storage
            .ok_or_else(|| Error::backend_unavailable("no key/value storage configured"))?;
        probe(storage.as_ref())?;

        Ok(StorageCache::new(
            storage,
            &self.namespace,
            Lifetime::new(self.default_lifetime),
            self.clock,
        ))
    }
}

fn probe(storage: &dyn KeyValueStorage) -> Result<()> {
    let written = storage
        .set_item(PROBE_KEY, PROBE_KEY)
        .and_then(|()| storage.remove_item(PROBE_KEY));

    match written {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == StorageErrorKind::QuotaExceeded && storage.len().is_ok_and(|len| len > 0) => {
            tracing::warn!(error = %e, "storage is full, using it anyway");
            Ok(())
        }
        Err(e) => Err(Error::backend_unavailable(e)),
    }
}

#[cfg(test)]
mod tests {
    use strata_tier::ErrorKind;

    use super::*;
    use crate::{MemoryStorage, StorageError};

    type StorageResult<T> = std::result::Result<T, StorageError>;

    #[derive(Debug)]
    struct Broken;

    impl KeyValueStorage for Broken {
        fn get_item(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::io("unplugged"))
        }

        fn set_item(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::io("unplugged"))
        }

        fn remove_item(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::io("unplugged"))
        }

        fn keys(&self) -> StorageResult<Vec<String>> {
            Err(StorageError::io("unplugged"))
        }
    }

    fn clock() -> Clock {
        tick::ClockControl::new().to_clock()
    }

    #[test]
    fn missing_storage_is_unavailable() {
        let error = StorageCache::<String>::builder(clock()).build().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BackendUnavailable);
    }

    #[test]
    fn failing_probe_is_unavailable() {
        let error = StorageCache::<String>::builder(clock())
            .storage(Arc::new(Broken))
            .build()
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BackendUnavailable);
    }

    #[test]
    fn full_but_used_storage_is_accepted() {
        let storage = Arc::new(MemoryStorage::with_quota(4));
        storage.set_item("a", "bc").unwrap();

        StorageCache::<String>::builder(clock()).storage(storage).build().unwrap();
    }

    #[test]
    fn full_and_empty_storage_is_unavailable() {
        let storage = Arc::new(MemoryStorage::with_quota(4));

        let error = StorageCache::<String>::builder(clock())
            .storage(storage)
            .build()
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BackendUnavailable);
    }

    #[test]
    fn namespace_with_separator_is_rejected() {
        let storage = Arc::new(MemoryStorage::new());

        let error = StorageCache::<String>::builder(clock())
            .storage(Arc::clone(&storage) as Arc<dyn KeyValueStorage>)
            .namespace("a:b")
            .build()
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        assert_eq!(storage.len().unwrap(), 0);
    }

    #[test]
    fn probe_leaves_no_trace() {
        let storage = Arc::new(MemoryStorage::new());
        StorageCache::<String>::builder(clock())
            .storage(Arc::clone(&storage) as Arc<dyn KeyValueStorage>)
            .build()
            .unwrap();
        assert_eq!(storage.len().unwrap(), 0);
    }
}
