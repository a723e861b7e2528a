// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock cache implementation for testing.
//!
//! [`MockCache`] keeps values in memory, records every operation it receives and
//! fails operations on demand, which makes it suitable for exercising error paths
//! of code layered on top of a [`Cache`].

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::{Cache, Error, Result, Ttl, ValueRepresentation, validate_key, validate_keys};

/// A recorded cache operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp<V> {
    /// `get` was called with this key.
    Get(String),
    /// `set` was called.
    Set {
        /// The key written.
        key: String,
        /// The value written.
        value: V,
        /// The requested lifetime.
        ttl: Ttl,
    },
    /// `delete` was called with this key.
    Delete(String),
    /// `clear` was called.
    Clear,
    /// `get_multiple` was called with these keys, in request order.
    GetMultiple(Vec<String>),
    /// `set_multiple` was called with these keys, sorted.
    SetMultiple {
        /// The keys written, sorted.
        keys: Vec<String>,
        /// The requested lifetime.
        ttl: Ttl,
    },
    /// `delete_multiple` was called with these keys, in request order.
    DeleteMultiple(Vec<String>),
    /// `has` was called with this key.
    Has(String),
    /// `prune` was called.
    Prune,
    /// `reset` was called.
    Reset,
}

type FailPredicate<V> = Box<dyn Fn(&CacheOp<V>) -> bool + Send + Sync>;

/// A recording, failure-injecting cache for tests.
///
/// Entries never expire on their own; a zero [`Ttl::After`] still deletes.
///
/// # Examples
///
/// ```
/// use strata_tier::{Cache, Ttl, testing::{CacheOp, MockCache}};
///
/// # futures::executor::block_on(async {
/// let cache = MockCache::<i32>::new();
/// cache.set("key", 42, Ttl::Never).await.unwrap();
/// assert_eq!(cache.get("key").await.unwrap(), Some(42));
///
/// cache.fail_when(|op| matches!(op, CacheOp::Get(_)));
/// assert!(cache.get("key").await.is_err());
/// # });
/// ```
pub struct MockCache<V> {
    data: Arc<Mutex<HashMap<String, V>>>,
    operations: Arc<Mutex<Vec<CacheOp<V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<V>>>>,
    representation: ValueRepresentation,
}

impl<V: std::fmt::Debug> std::fmt::Debug for MockCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCache")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .field("representation", &self.representation)
            .finish()
    }
}

impl<V> Clone for MockCache<V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
            representation: self.representation,
        }
    }
}

impl<V> Default for MockCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MockCache<V> {
    /// Creates an empty mock cache that reports [`ValueRepresentation::Native`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(HashMap::new())
    }

    /// Creates a mock cache holding `data`.
    #[must_use]
    pub fn with_data(data: HashMap<String, V>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
            representation: ValueRepresentation::Native,
        }
    }

    /// Makes this cache report the given value representation.
    #[must_use]
    pub fn with_representation(mut self, representation: ValueRepresentation) -> Self {
        self.representation = representation;
        self
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns `true` if `key` is stored.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Makes every operation matching `predicate` fail with [`ErrorKind::Storage`](crate::ErrorKind::Storage).
    ///
    /// Failed operations are still recorded.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&CacheOp<V>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Removes the failure predicate.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Forgets every recorded operation.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn check(&self, op: CacheOp<V>) -> Result<()> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        if fail {
            return Err(Error::storage("injected failure"));
        }
        Ok(())
    }
}

impl<V: Clone> MockCache<V> {
    /// Returns every recorded operation, oldest first.
    #[must_use]
    pub fn operations(&self) -> Vec<CacheOp<V>> {
        self.operations.lock().clone()
    }
}

impl<V> Cache<V> for MockCache<V>
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Option<V>> {
        validate_key(key)?;
        self.check(CacheOp::Get(key.to_owned()))?;
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: V, ttl: Ttl) -> Result<bool> {
        validate_key(key)?;
        self.check(CacheOp::Set {
            key: key.to_owned(),
            value: value.clone(),
            ttl,
        })?;

        let mut data = self.data.lock();
        if ttl == Ttl::After(std::time::Duration::ZERO) {
            data.remove(key);
        } else {
            data.insert(key.to_owned(), value);
        }
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        self.check(CacheOp::Delete(key.to_owned()))?;
        self.data.lock().remove(key);
        Ok(true)
    }

    async fn clear(&self) -> Result<bool> {
        self.check(CacheOp::Clear)?;
        self.data.lock().clear();
        Ok(true)
    }

    async fn get_multiple(&self, keys: &[String]) -> Result<HashMap<String, Option<V>>> {
        validate_keys(keys)?;
        self.check(CacheOp::GetMultiple(keys.to_vec()))?;
        let data = self.data.lock();
        Ok(keys.iter().map(|key| (key.clone(), data.get(key).cloned())).collect())
    }

    async fn set_multiple(&self, entries: HashMap<String, V>, ttl: Ttl) -> Result<bool> {
        validate_keys(entries.keys())?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        self.check(CacheOp::SetMultiple { keys, ttl })?;

        let mut data = self.data.lock();
        for (key, value) in entries {
            if ttl == Ttl::After(std::time::Duration::ZERO) {
                data.remove(&key);
            } else {
                data.insert(key, value);
            }
        }
        Ok(true)
    }

    async fn delete_multiple(&self, keys: &[String]) -> Result<bool> {
        validate_keys(keys)?;
        self.check(CacheOp::DeleteMultiple(keys.to_vec()))?;
        let mut data = self.data.lock();
        for key in keys {
            data.remove(key);
        }
        Ok(true)
    }

    async fn has(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        self.check(CacheOp::Has(key.to_owned()))?;
        Ok(self.data.lock().contains_key(key))
    }

    async fn prune(&self) -> Result<bool> {
        self.check(CacheOp::Prune)?;
        Ok(true)
    }

    async fn reset(&self) -> Result<()> {
        self.check(CacheOp::Reset)
    }

    fn value_representation(&self) -> ValueRepresentation {
        self.representation
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn records_operations_in_order() {
        let cache = MockCache::<i32>::new();
        block_on(cache.set("a", 1, Ttl::Never)).unwrap();
        block_on(cache.get("a")).unwrap();
        block_on(cache.delete("a")).unwrap();

        assert_eq!(
            cache.operations(),
            vec![
                CacheOp::Set {
                    key: "a".to_string(),
                    value: 1,
                    ttl: Ttl::Never
                },
                CacheOp::Get("a".to_string()),
                CacheOp::Delete("a".to_string()),
            ]
        );
    }

    #[test]
    fn failure_predicate_is_scoped_to_matching_operations() {
        let cache = MockCache::<i32>::new();
        cache.fail_when(|op| matches!(op, CacheOp::Get(k) if k == "bad"));

        assert_eq!(block_on(cache.get("bad")).unwrap_err().kind(), ErrorKind::Storage);
        assert_eq!(block_on(cache.get("good")).unwrap(), None);

        cache.clear_failures();
        assert_eq!(block_on(cache.get("bad")).unwrap(), None);
    }

    #[test]
    fn zero_ttl_removes_the_entry() {
        let cache = MockCache::with_data(HashMap::from([("a".to_string(), 1)]));
        block_on(cache.set("a", 2, Ttl::After(std::time::Duration::ZERO))).unwrap();
        assert!(!cache.contains_key("a"));
    }

    #[test]
    fn clones_share_state() {
        let cache = MockCache::<i32>::new();
        let clone = cache.clone();
        block_on(clone.set("a", 1, Ttl::Never)).unwrap();
        assert_eq!(cache.entry_count(), 1);
    }
}
