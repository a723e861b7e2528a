// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Composition of caches into fastest-first tiers.

use std::collections::HashMap;
use std::time::Duration;

use futures::future::BoxFuture;
use strata_tier::{Cache, DynamicCache, Error, Result, Ttl, ValueRepresentation, validate_key, validate_keys};

use crate::ChainCacheBuilder;
use crate::telemetry::{CacheActivity, CacheOperation, CacheTelemetry};

pub(crate) const DEFAULT_NAME: &str = "strata.chain";

/// A cache made of ordered tiers, fastest first.
///
/// Reads probe the tiers in order and copy a value found in a slower tier into
/// every faster tier that missed it. Writes and removals run from the slowest
/// tier to the fastest, so a concurrent reader is more likely to fall through to
/// a fresh slow entry than to find a stale fast one. Nothing is locked across
/// tiers: two operations racing on one key may leave the tiers disagreeing until
/// the next write.
///
/// A failing tier never fails the chain. A read error counts as a miss for that
/// tier and a write error makes the write report `false`. Both are recorded
/// through the chain's [`CacheTelemetry`].
///
/// # Examples
///
/// ```
/// use strata::{ChainCache, DynamicCacheExt, MemoryCache, Ttl};
/// use strata_tier::Cache;
/// use tick::ClockControl;
///
/// # futures::executor::block_on(async {
/// let clock = ClockControl::new().to_clock();
/// let fast = MemoryCache::<String>::builder(clock.clone()).build().into_dynamic();
/// let slow = MemoryCache::<String>::builder(clock).build().into_dynamic();
/// slow.set("greeting", "hello".to_owned(), Ttl::Never).await.unwrap();
///
/// let chain = ChainCache::builder()
///     .tier(fast.clone())
///     .tier(slow)
///     .build()
///     .unwrap();
///
/// assert_eq!(chain.get("greeting").await.unwrap().as_deref(), Some("hello"));
/// assert_eq!(fast.get("greeting").await.unwrap().as_deref(), Some("hello"));
/// # });
/// ```
#[derive(Debug)]
pub struct ChainCache<V> {
    tiers: Vec<DynamicCache<V>>,
    backfill_ttl: Ttl,
    representation: ValueRepresentation,
    name: &'static str,
    telemetry: CacheTelemetry,
}

impl<V> ChainCache<V> {
    /// Composes `tiers`, fastest first.
    ///
    /// Values copied into faster tiers live for `default_lifetime`, or for each
    /// tier's own default lifetime when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](strata_tier::ErrorKind::InvalidArgument)
    /// when `tiers` is empty.
    pub fn new(tiers: Vec<DynamicCache<V>>, default_lifetime: Option<Duration>) -> Result<Self>
    where
        V: Send,
    {
        Self::from_parts(tiers, default_lifetime, DEFAULT_NAME, CacheTelemetry::new())
    }

    /// Starts configuring a chain.
    #[must_use]
    pub fn builder() -> ChainCacheBuilder<V> {
        ChainCacheBuilder::new()
    }

    pub(crate) fn from_parts(
        tiers: Vec<DynamicCache<V>>,
        default_lifetime: Option<Duration>,
        name: &'static str,
        telemetry: CacheTelemetry,
    ) -> Result<Self>
    where
        V: Send,
    {
        if tiers.is_empty() {
            return Err(Error::invalid_argument("a chain needs at least one tier"));
        }

        let representation = ValueRepresentation::combine(tiers.iter().map(|tier| tier.value_representation()));
        Ok(Self {
            tiers,
            backfill_ttl: default_lifetime.map_or(Ttl::Default, Ttl::After),
            representation,
            name,
            telemetry,
        })
    }

    /// Returns the tiers, fastest first.
    #[must_use]
    pub fn tiers(&self) -> &[DynamicCache<V>] {
        &self.tiers
    }

    fn succeeded(&self, operation: CacheOperation, result: Result<bool>) -> bool {
        match result {
            Ok(done) => done,
            Err(e) => {
                self.telemetry.record_error(self.name, operation, &e);
                false
            }
        }
    }

    fn record_outcome(&self, operation: CacheOperation, done: bool) {
        let activity = if done { CacheActivity::Ok } else { CacheActivity::Error };
        self.telemetry.record(self.name, operation, activity);
    }
}

impl<V> ChainCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn backfill(&self, faster: &[DynamicCache<V>], key: &str, value: &V) {
        for tier in faster.iter().rev() {
            let stored = tier.set(key, value.clone(), self.backfill_ttl).await;
            if self.succeeded(CacheOperation::Get, stored) {
                self.telemetry.record(self.name, CacheOperation::Get, CacheActivity::Backfill);
            }
        }
    }

    /// Resolves `keys` from tier `index` onward, querying each tier only for the
    /// keys every faster tier missed and backfilling on the way back.
    fn resolve(&self, index: usize, keys: Vec<String>) -> BoxFuture<'_, HashMap<String, Option<V>>> {
        Box::pin(async move {
            let Some(tier) = self.tiers.get(index) else {
                return keys.into_iter().map(|key| (key, None)).collect();
            };

            let mut found = match tier.get_multiple(&keys).await {
                Ok(found) => found,
                Err(e) => {
                    self.telemetry.record_error(self.name, CacheOperation::GetMultiple, &e);
                    HashMap::new()
                }
            };
            let missing: Vec<String> = keys
                .into_iter()
                .filter(|key| !matches!(found.get(key), Some(Some(_))))
                .collect();
            if missing.is_empty() {
                return found;
            }

            let deeper = self.resolve(index + 1, missing).await;
            let backfill: HashMap<String, V> = deeper
                .iter()
                .filter_map(|(key, value)| value.clone().map(|value| (key.clone(), value)))
                .collect();
            if !backfill.is_empty() {
                let stored = tier.set_multiple(backfill, self.backfill_ttl).await;
                if self.succeeded(CacheOperation::GetMultiple, stored) {
                    self.telemetry
                        .record(self.name, CacheOperation::GetMultiple, CacheActivity::Backfill);
                }
            }

            found.extend(deeper);
            found
        })
    }
}

impl<V> Cache<V> for ChainCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>> {
        validate_key(key)?;
        for (index, tier) in self.tiers.iter().enumerate() {
            match tier.get(key).await {
                Ok(Some(value)) => {
                    self.telemetry.record(self.name, CacheOperation::Get, CacheActivity::Hit);
                    self.backfill(&self.tiers[..index], key, &value).await;
                    return Ok(Some(value));
                }
                Ok(None) => {}
                Err(e) => self.telemetry.record_error(self.name, CacheOperation::Get, &e),
            }
        }

        self.telemetry.record(self.name, CacheOperation::Get, CacheActivity::Miss);
        Ok(None)
    }

    async fn set(&self, key: &str, value: V, ttl: Ttl) -> Result<bool> {
        validate_key(key)?;
        let mut stored = true;
        for tier in self.tiers.iter().rev() {
            stored &= self.succeeded(CacheOperation::Set, tier.set(key, value.clone(), ttl).await);
        }

        if stored {
            self.telemetry.record(self.name, CacheOperation::Set, CacheActivity::Inserted);
        }
        Ok(stored)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let mut deleted = true;
        for tier in self.tiers.iter().rev() {
            deleted &= self.succeeded(CacheOperation::Delete, tier.delete(key).await);
        }

        self.record_outcome(CacheOperation::Delete, deleted);
        Ok(deleted)
    }

    async fn clear(&self) -> Result<bool> {
        let mut cleared = true;
        for tier in self.tiers.iter().rev() {
            cleared &= self.succeeded(CacheOperation::Clear, tier.clear().await);
        }

        self.record_outcome(CacheOperation::Clear, cleared);
        Ok(cleared)
    }

    async fn get_multiple(&self, keys: &[String]) -> Result<HashMap<String, Option<V>>> {
        validate_keys(keys)?;
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let found = self.resolve(0, keys.to_vec()).await;
        let activity = if found.values().all(Option::is_some) {
            CacheActivity::Hit
        } else {
            CacheActivity::Miss
        };
        self.telemetry.record(self.name, CacheOperation::GetMultiple, activity);
        Ok(found)
    }

    async fn set_multiple(&self, entries: HashMap<String, V>, ttl: Ttl) -> Result<bool> {
        validate_keys(entries.keys())?;
        let mut stored = true;
        for tier in self.tiers.iter().rev() {
            stored &= self.succeeded(CacheOperation::SetMultiple, tier.set_multiple(entries.clone(), ttl).await);
        }

        if stored {
            self.telemetry
                .record(self.name, CacheOperation::SetMultiple, CacheActivity::Inserted);
        }
        Ok(stored)
    }

    async fn delete_multiple(&self, keys: &[String]) -> Result<bool> {
        validate_keys(keys)?;
        let mut deleted = true;
        for tier in self.tiers.iter().rev() {
            deleted &= self.succeeded(CacheOperation::DeleteMultiple, tier.delete_multiple(keys).await);
        }

        self.record_outcome(CacheOperation::DeleteMultiple, deleted);
        Ok(deleted)
    }

    async fn has(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        for tier in &self.tiers {
            match tier.has(key).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => self.telemetry.record_error(self.name, CacheOperation::Has, &e),
            }
        }
        Ok(false)
    }

    async fn prune(&self) -> Result<bool> {
        let mut pruned = true;
        for tier in &self.tiers {
            pruned &= self.succeeded(CacheOperation::Prune, tier.prune().await);
        }

        self.record_outcome(CacheOperation::Prune, pruned);
        Ok(pruned)
    }

    async fn reset(&self) -> Result<()> {
        for tier in &self.tiers {
            if let Err(e) = tier.reset().await {
                self.telemetry.record_error(self.name, CacheOperation::Reset, &e);
            }
        }
        Ok(())
    }

    fn value_representation(&self) -> ValueRepresentation {
        self.representation
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use strata_tier::testing::{CacheOp, MockCache};
    use strata_tier::{DynamicCacheExt, ErrorKind};

    use super::*;

    fn chain(tiers: &[&MockCache<u32>]) -> ChainCache<u32> {
        ChainCache::from_parts(
            tiers.iter().map(|tier| (*tier).clone().into_dynamic()).collect(),
            Some(Duration::from_secs(5)),
            "test",
            CacheTelemetry::disabled(),
        )
        .unwrap()
    }

    #[test]
    fn needs_a_tier() {
        let error = ChainCache::<u32>::new(Vec::new(), None).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn backfill_uses_chain_lifetime() {
        let fast = MockCache::new();
        let slow = MockCache::with_data([("k".to_owned(), 7)].into());
        let cache = chain(&[&fast, &slow]);

        assert_eq!(block_on(cache.get("k")).unwrap(), Some(7));
        assert!(fast.operations().contains(&CacheOp::Set {
            key: "k".to_owned(),
            value: 7,
            ttl: Ttl::After(Duration::from_secs(5)),
        }));
    }

    #[test]
    fn backfill_without_lifetime_defers_to_tier_default() {
        let fast = MockCache::new();
        let slow = MockCache::with_data([("k".to_owned(), 7)].into());
        let cache = ChainCache::new(vec![fast.clone().into_dynamic(), slow.into_dynamic()], None).unwrap();

        block_on(cache.get("k")).unwrap();

        assert!(fast.operations().contains(&CacheOp::Set {
            key: "k".to_owned(),
            value: 7,
            ttl: Ttl::Default,
        }));
    }

    #[test]
    fn writes_run_slowest_first() {
        let fast = MockCache::new();
        let slow = MockCache::new();
        let order = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        {
            let order = std::sync::Arc::clone(&order);
            fast.fail_when(move |op| {
                if matches!(op, CacheOp::Delete(_)) {
                    order.lock().push("fast");
                }
                false
            });
        }
        {
            let order = std::sync::Arc::clone(&order);
            slow.fail_when(move |op| {
                if matches!(op, CacheOp::Delete(_)) {
                    order.lock().push("slow");
                }
                false
            });
        }
        let cache = chain(&[&fast, &slow]);

        assert!(block_on(cache.delete("k")).unwrap());
        assert_eq!(*order.lock(), ["slow", "fast"]);
    }

    #[test]
    fn batch_reads_only_ask_slower_tiers_for_misses() {
        let fast = MockCache::with_data([("a".to_owned(), 1)].into());
        let slow = MockCache::with_data([("b".to_owned(), 2)].into());
        let cache = chain(&[&fast, &slow]);
        let keys = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];

        let found = block_on(cache.get_multiple(&keys)).unwrap();

        assert_eq!(found, HashMap::from([("a".to_owned(), Some(1)), ("b".to_owned(), Some(2)), ("c".to_owned(), None)]));
        assert_eq!(
            slow.operations(),
            [CacheOp::GetMultiple(vec!["b".to_owned(), "c".to_owned()])]
        );
        assert!(fast.contains_key("b"));
        assert!(!fast.contains_key("c"));
    }

    #[test]
    fn full_fast_hit_skips_slower_tiers() {
        let fast = MockCache::with_data([("a".to_owned(), 1)].into());
        let slow = MockCache::new();
        let cache = chain(&[&fast, &slow]);

        let found = block_on(cache.get_multiple(&["a".to_owned()])).unwrap();

        assert_eq!(found["a"], Some(1));
        assert!(slow.operations().is_empty());
    }

    #[test]
    fn presence_stops_at_first_hit_without_backfill() {
        let fast = MockCache::new();
        let middle = MockCache::with_data([("k".to_owned(), 1)].into());
        let slow = MockCache::new();
        let cache = chain(&[&fast, &middle, &slow]);

        assert!(block_on(cache.has("k")).unwrap());
        assert!(!fast.contains_key("k"));
        assert!(slow.operations().is_empty());
        assert!(!block_on(cache.has("other")).unwrap());
    }

    #[test]
    fn representation_is_serialized_if_any_tier_is() {
        let native = MockCache::<u32>::new();
        let serialized = MockCache::<u32>::new().with_representation(ValueRepresentation::Serialized);
        let cache = chain(&[&native, &serialized]);
        assert_eq!(cache.value_representation(), ValueRepresentation::Serialized);

        let cache = chain(&[&native]);
        assert_eq!(cache.value_representation(), ValueRepresentation::Native);
    }
}
