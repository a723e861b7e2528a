// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-memory caches.

use std::marker::PhantomData;
use std::time::Duration;

use tick::Clock;

use crate::cache::MemoryCache;

/// Builder for a [`MemoryCache`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use strata_memory::MemoryCache;
/// use tick::ClockControl;
///
/// let clock = ClockControl::new().to_clock();
/// let cache = MemoryCache::<String>::builder(clock)
///     .default_lifetime(Duration::from_secs(300))
///     .initial_capacity(64)
///     .build();
/// assert_eq!(cache.len(), 0);
/// ```
#[derive(Debug)]
pub struct MemoryCacheBuilder<V> {
    pub(crate) clock: Clock,
    pub(crate) default_lifetime: Option<Duration>,
    pub(crate) initial_capacity: usize,
    _value: PhantomData<fn() -> V>,
}

impl<V> MemoryCacheBuilder<V> {
    pub(crate) fn new(clock: Clock) -> Self {
        Self {
            clock,
            default_lifetime: None,
            initial_capacity: 0,
            _value: PhantomData,
        }
    }

    /// Sets the lifetime of entries written with [`Ttl::Default`](strata_tier::Ttl::Default).
    ///
    /// Without a default lifetime, or with a zero one, such entries never expire.
    #[must_use]
    pub fn default_lifetime(mut self, lifetime: Duration) -> Self {
        self.default_lifetime = Some(lifetime);
        self
    }

    /// Pre-allocates room for this many entries.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

impl<V> MemoryCacheBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Builds the cache.
    #[must_use]
    pub fn build(self) -> MemoryCache<V> {
        MemoryCache::from_builder(self)
    }
}
