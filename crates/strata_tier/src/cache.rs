// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The key/value contract every cache backend implements.

use std::collections::HashMap;

use crate::{Error, Result, Ttl};

/// How a backend keeps values internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueRepresentation {
    /// Values are serialized to strings before they reach the storage medium.
    Serialized,
    /// Values are kept as native objects.
    Native,
}

impl ValueRepresentation {
    /// Combines the representations of several backends.
    ///
    /// The result is [`ValueRepresentation::Serialized`] as soon as any member
    /// serializes, since a value that passes through every member must then
    /// stay serializable.
    #[must_use]
    pub fn combine(representations: impl IntoIterator<Item = Self>) -> Self {
        if representations.into_iter().any(|r| r == Self::Serialized) {
            Self::Serialized
        } else {
            Self::Native
        }
    }
}

/// Rejects keys that no backend can store.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidArgument`](crate::ErrorKind::InvalidArgument) for an empty key.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::invalid_argument("cache keys must not be empty"));
    }
    Ok(())
}

/// Validates every key of a batch before any of them reaches a backend.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidArgument`](crate::ErrorKind::InvalidArgument) when any key is empty.
pub fn validate_keys<'a>(keys: impl IntoIterator<Item = &'a String>) -> Result<()> {
    keys.into_iter().try_for_each(|key| validate_key(key))
}

/// Turns a failed single-key read inside a batch into a miss.
///
/// Batch reads never fail on an unreadable entry; the failure is logged and the
/// key reported as absent.
#[must_use]
pub fn read_or_miss<V>(key: &str, read: Result<Option<V>>) -> Option<V> {
    read.unwrap_or_else(|e| {
        tracing::warn!(cache.key = key, error = %e, "reading batch entry failed, treating it as a miss");
        None
    })
}

/// Asynchronous key/value cache with per-entry lifetimes.
///
/// Reads return `Ok(None)` for keys that are absent or expired; a backend never
/// serves an expired entry and removes it when it finds one. Writes report
/// `Ok(false)` when the backend declined them and `Err` for invalid input or an
/// unreachable backend.
///
/// `prune` and `reset` are optional: the provided implementations do nothing and
/// succeed.
#[cfg_attr(
    any(test, feature = "dynamic-cache"),
    dynosaur::dynosaur(pub(crate) DynCache = dyn(box) Cache, bridge(none))
)]
pub trait Cache<V>: Send + Sync {
    /// Returns the value stored under `key`, if present and unexpired.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<V>>> + Send;

    /// Stores `value` under `key` for the given lifetime.
    ///
    /// A zero [`Ttl::After`] deletes `key` instead.
    fn set(&self, key: &str, value: V, ttl: Ttl) -> impl Future<Output = Result<bool>> + Send;

    /// Removes `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Removes every entry owned by this cache.
    fn clear(&self) -> impl Future<Output = Result<bool>> + Send;

    /// Looks up several keys at once.
    ///
    /// The returned map holds every requested key, with `None` for misses. A key
    /// whose entry cannot be read is a miss; only invalid keys fail the batch.
    fn get_multiple(&self, keys: &[String]) -> impl Future<Output = Result<HashMap<String, Option<V>>>> + Send;

    /// Stores several entries with the same lifetime.
    ///
    /// Returns `Ok(true)` only if every entry was stored.
    fn set_multiple(&self, entries: HashMap<String, V>, ttl: Ttl) -> impl Future<Output = Result<bool>> + Send;

    /// Removes several keys. Returns `Ok(true)` only if every removal succeeded.
    fn delete_multiple(&self, keys: &[String]) -> impl Future<Output = Result<bool>> + Send;

    /// Returns `true` if `key` is present and unexpired.
    fn has(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Removes every expired entry.
    fn prune(&self) -> impl Future<Output = Result<bool>> + Send {
        async { Ok(true) }
    }

    /// Returns the cache to its initial state. Backends that support it drop every entry.
    fn reset(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// Describes how this cache keeps values internally.
    fn value_representation(&self) -> ValueRepresentation {
        ValueRepresentation::Native
    }
}

/// Convenience reads that substitute a caller-supplied default for misses.
pub trait CacheExt<V>: Cache<V> {
    /// Returns the value stored under `key`, or `default` on a miss.
    fn get_or(&self, key: &str, default: V) -> impl Future<Output = Result<V>> + Send
    where
        V: Send,
    {
        async move { Ok(self.get(key).await?.unwrap_or(default)) }
    }

    /// Looks up several keys, mapping every miss to a clone of `default`.
    fn get_multiple_or(&self, keys: &[String], default: V) -> impl Future<Output = Result<HashMap<String, V>>> + Send
    where
        V: Clone + Send + Sync,
    {
        async move {
            let found = self.get_multiple(keys).await?;
            Ok(found
                .into_iter()
                .map(|(key, value)| (key, value.unwrap_or_else(|| default.clone())))
                .collect())
        }
    }
}

impl<V, C> CacheExt<V> for C where C: Cache<V> + ?Sized {}

/// Blocking mirror of [`Cache`] for backends with local, non-blocking storage.
///
/// Each method behaves exactly like its asynchronous counterpart.
pub trait CacheSync<V> {
    /// See [`Cache::get`].
    ///
    /// # Errors
    ///
    /// Fails for an empty key or an unreadable backend.
    fn get_sync(&self, key: &str) -> Result<Option<V>>;

    /// See [`Cache::set`].
    ///
    /// # Errors
    ///
    /// Fails for an empty key or an unwritable backend.
    fn set_sync(&self, key: &str, value: V, ttl: Ttl) -> Result<bool>;

    /// See [`Cache::delete`].
    ///
    /// # Errors
    ///
    /// Fails for an empty key or an unwritable backend.
    fn delete_sync(&self, key: &str) -> Result<bool>;

    /// See [`Cache::clear`].
    ///
    /// # Errors
    ///
    /// Fails for an unwritable backend.
    fn clear_sync(&self) -> Result<bool>;

    /// See [`Cache::get_multiple`].
    ///
    /// # Errors
    ///
    /// Fails if any key is empty.
    fn get_multiple_sync(&self, keys: &[String]) -> Result<HashMap<String, Option<V>>> {
        validate_keys(keys)?;
        Ok(keys
            .iter()
            .map(|key| (key.clone(), read_or_miss(key, self.get_sync(key))))
            .collect())
    }

    /// See [`Cache::set_multiple`].
    ///
    /// # Errors
    ///
    /// Fails if any key is empty.
    fn set_multiple_sync(&self, entries: HashMap<String, V>, ttl: Ttl) -> Result<bool> {
        validate_keys(entries.keys())?;
        let mut stored = true;
        for (key, value) in entries {
            stored &= self.set_sync(&key, value, ttl)?;
        }
        Ok(stored)
    }

    /// See [`Cache::delete_multiple`].
    ///
    /// # Errors
    ///
    /// Fails if any key is empty.
    fn delete_multiple_sync(&self, keys: &[String]) -> Result<bool> {
        validate_keys(keys)?;
        let mut deleted = true;
        for key in keys {
            deleted &= self.delete_sync(key)?;
        }
        Ok(deleted)
    }

    /// See [`Cache::has`].
    ///
    /// # Errors
    ///
    /// Fails for an empty key.
    fn has_sync(&self, key: &str) -> Result<bool>;

    /// See [`Cache::prune`].
    ///
    /// # Errors
    ///
    /// Fails for an unwritable backend.
    fn prune_sync(&self) -> Result<bool> {
        Ok(true)
    }

    /// See [`Cache::reset`].
    ///
    /// # Errors
    ///
    /// Fails for an unwritable backend.
    fn reset_sync(&self) -> Result<()> {
        Ok(())
    }
}
